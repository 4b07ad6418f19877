use crate::{Message, MessageId, ProcessingStatus};

/// System text shown while a message is still being polled.
pub const PROCESSING_TEXT: &str = "Processing your message...";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatViewModel {
    pub messages: Vec<MessageRowView>,
    pub in_flight: usize,
    pub sending: bool,
    pub loading_history: bool,
    pub last_error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRowView {
    pub id: MessageId,
    pub user_text: String,
    /// `None` when there is no system reply to show yet.
    pub system_text: Option<String>,
    pub status: ProcessingStatus,
    pub status_label: &'static str,
    pub processing: bool,
    /// Finished poll attempts, present only while in flight.
    pub attempts: Option<u32>,
    pub created_at: String,
}

impl MessageRowView {
    pub(crate) fn from_message(message: &Message, attempts: Option<u32>) -> Self {
        let processing = attempts.is_some();
        let system_text = if processing {
            Some(PROCESSING_TEXT.to_string())
        } else if message.system_text.is_empty() {
            None
        } else {
            Some(message.system_text.clone())
        };
        Self {
            id: message.id.clone(),
            user_text: message.user_text.clone(),
            system_text,
            status: message.status,
            status_label: message.status.label(),
            processing,
            attempts,
            created_at: message.created_at.clone(),
        }
    }
}
