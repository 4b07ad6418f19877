use crate::{MessageId, SubmissionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch one page of conversation history.
    LoadHistory { page: u32 },
    /// Send trimmed user text to the backend.
    SendMessage {
        submission_id: SubmissionId,
        text: String,
    },
    /// Start polling the status endpoint for a freshly tracked message.
    StartPolling { message_id: MessageId },
    /// Stop polling a message; the poll resolves as cancelled.
    CancelPolling { message_id: MessageId },
    /// Input is closed and nothing is left in flight.
    Quit,
}
