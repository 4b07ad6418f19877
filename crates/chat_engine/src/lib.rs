//! Chat engine: backend transport, submission, status polling and effect
//! execution.
mod client;
mod config;
mod engine;
mod history;
mod poll;
mod submit;
mod types;

pub use client::{ChatBackend, ClientSettings, ReqwestChatBackend};
pub use config::{ConfigError, EngineConfig};
pub use engine::EngineHandle;
pub use history::load_history;
pub use poll::{ChannelProgressSink, PollSettings, ProgressSink, StatusPoller};
pub use submit::submit_message;
pub use types::{
    AttemptObservation, ChatHistoryResponse, ClientError, EngineEvent, FailureKind,
    HistoryMessage, MessageId, MessagesStatusRequest, MessagesStatusResponse, PollAttempt,
    PollError, SendMessageRequest, SendMessageResponse, StatusRecord, Submission, SubmissionId,
    SubmitError, STATUS_ERROR, STATUS_SUCCESS, STATUS_UNDER_PROCESSING,
};
