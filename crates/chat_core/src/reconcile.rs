use chat_logging::{chat_debug, chat_error, chat_info, chat_warn};

use crate::{ChatState, ProcessingStatus};

/// System text stored for every message that did not resolve successfully.
pub const FAILURE_PLACEHOLDER: &str = "Failed to get response. Please try again.";

/// System text stored when the backend succeeded without a response body.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response received";

/// How a poll for one message ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Backend reported a terminal status with a response.
    Success {
        system_text: String,
        status: ProcessingStatus,
    },
    /// Backend reported processing failure. `detail` is logged only.
    Failure {
        status: ProcessingStatus,
        detail: Option<String>,
    },
    /// Attempt budget ran out without a terminal status.
    Timeout,
    /// Polling was stopped before a terminal status arrived.
    Cancelled,
}

/// Result of merging an outcome into the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The message reached the given terminal status.
    Applied(ProcessingStatus),
    /// The message already has its reply or a status the client does not
    /// own; nothing changed.
    AlreadyResolved,
    /// No message with that id is tracked.
    UnknownMessage,
}

impl ChatState {
    /// Merges a poll outcome into the ledger. Writes each message at most once.
    /// The id always leaves the in-flight set, whichever branch runs.
    pub fn apply_outcome(&mut self, message_id: &str, outcome: Outcome) -> Reconciliation {
        self.remove_in_flight(message_id);

        let Some(message) = self.message_mut(message_id) else {
            chat_error!("outcome {:?} for untracked message {}", outcome, message_id);
            return Reconciliation::UnknownMessage;
        };
        if !message.status.awaits_reply() {
            chat_debug!(
                "message {} already {:?}; ignoring outcome {:?}",
                message_id,
                message.status,
                outcome
            );
            return Reconciliation::AlreadyResolved;
        }

        let (system_text, status) = match outcome {
            Outcome::Success {
                system_text,
                status,
            } => {
                let status = if status.is_terminal() {
                    status
                } else {
                    chat_warn!(
                        "success for message {} carried non-terminal {:?}",
                        message_id,
                        status
                    );
                    ProcessingStatus::Success
                };
                let text = if system_text.is_empty() {
                    NO_RESPONSE_PLACEHOLDER.to_string()
                } else {
                    system_text
                };
                (text, status)
            }
            Outcome::Failure { status, detail } => {
                chat_warn!(
                    "backend failed message {} with {:?}: {}",
                    message_id,
                    status,
                    detail.as_deref().unwrap_or("<no detail>")
                );
                (FAILURE_PLACEHOLDER.to_string(), ProcessingStatus::Error)
            }
            Outcome::Timeout => {
                chat_warn!("polling timed out for message {}", message_id);
                (FAILURE_PLACEHOLDER.to_string(), ProcessingStatus::Error)
            }
            Outcome::Cancelled => {
                chat_info!("polling cancelled for message {}", message_id);
                (FAILURE_PLACEHOLDER.to_string(), ProcessingStatus::Error)
            }
        };

        message.system_text = system_text;
        message.status = status;
        self.mark_dirty();
        Reconciliation::Applied(status)
    }
}
