use chat_logging::{chat_info, chat_warn};

use crate::{ChatBackend, MessageId, SubmitError};

const ACCEPTED: &str = "success";

/// Sends one user message and returns the id the backend issued for it.
///
/// Blank text is refused before any request is made. A failed send is never
/// retried here; the user has to send again.
pub async fn submit_message(
    backend: &dyn ChatBackend,
    user_id: &str,
    text: &str,
) -> Result<MessageId, SubmitError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SubmitError::EmptyText);
    }

    let response = backend.send_message(user_id, text).await.map_err(|err| {
        chat_warn!("sendMessage failed: {}", err);
        SubmitError::Transport(err)
    })?;

    if response.status != ACCEPTED {
        chat_warn!("sendMessage rejected with status {:?}", response.status);
        return Err(SubmitError::Rejected {
            status: response.status,
        });
    }

    match response.message_id {
        Some(message_id) if !message_id.is_empty() => {
            chat_info!("message {} accepted ({} chars)", message_id, text.len());
            Ok(message_id)
        }
        _ => Err(SubmitError::MissingMessageId),
    }
}
