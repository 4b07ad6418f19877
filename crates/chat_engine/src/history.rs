use chat_logging::chat_info;

use crate::{ChatBackend, ClientError, FailureKind, HistoryMessage};

const HISTORY_OK: &str = "ok";

/// Fetches one page of the user's conversation.
pub async fn load_history(
    backend: &dyn ChatBackend,
    user_id: &str,
    page_number: u32,
) -> Result<Vec<HistoryMessage>, ClientError> {
    let response = backend.get_chat(user_id, page_number).await?;
    if response.status != HISTORY_OK {
        return Err(ClientError::new(
            FailureKind::UnexpectedEnvelope {
                status: response.status.clone(),
            },
            "history request not ok",
        ));
    }
    chat_info!(
        "loaded {} history messages (page {})",
        response.data.len(),
        page_number
    );
    Ok(response.data)
}
