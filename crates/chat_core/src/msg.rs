#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Front end is up; load the conversation history.
    Started,
    /// User entered a line of text to send.
    SendRequested(String),
    /// Backend acknowledged a submission with its message id.
    SubmissionAccepted {
        submission_id: crate::SubmissionId,
        message_id: crate::MessageId,
        created_at: String,
    },
    /// Submission failed before any message id was issued.
    SubmissionFailed {
        submission_id: crate::SubmissionId,
        failure: crate::SubmissionFailure,
    },
    /// History page arrived from the backend.
    HistoryLoaded(Vec<crate::Message>),
    /// History request failed; the conversation starts empty.
    HistoryFailed,
    /// Poller finished attempt `attempt` for a message without a terminal status.
    PollProgress {
        message_id: crate::MessageId,
        attempt: u32,
    },
    /// Poller finished for a message.
    PollResolved {
        message_id: crate::MessageId,
        outcome: crate::Outcome,
    },
    /// User asked to stop waiting for a message.
    CancelRequested(crate::MessageId),
    /// No more user input will arrive.
    InputClosed,
    /// Fallback for placeholder wiring.
    NoOp,
}
