use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type MessageId = String;
pub type SubmissionId = u64;

/// Wire code: backend is still working on the message.
pub const STATUS_UNDER_PROCESSING: i64 = 5;
/// Wire code: terminal, processing succeeded.
pub const STATUS_SUCCESS: i64 = 6;
/// Wire code: terminal, processing failed.
pub const STATUS_ERROR: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessageRequest<'a> {
    pub user_id: &'a str,
    pub message: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendMessageResponse {
    pub status: String,
    #[serde(default)]
    pub message_id: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagesStatusRequest<'a> {
    pub user_id: &'a str,
    pub message_ids: &'a [MessageId],
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessagesStatusResponse {
    pub status: String,
    #[serde(default)]
    pub data: Vec<StatusRecord>,
}

/// Status of one message as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusRecord {
    pub id: MessageId,
    pub status: i64,
    #[serde(default)]
    pub system_response: Option<String>,
}

impl StatusRecord {
    /// Only 6 and 7 are terminal; every other code means "keep polling".
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, STATUS_SUCCESS | STATUS_ERROR)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatHistoryResponse {
    pub status: String,
    #[serde(default)]
    pub data: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryMessage {
    pub id: MessageId,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub system_message: String,
    /// Absent on entries the backend never classified.
    #[serde(default)]
    pub system_message_status: Option<i64>,
    #[serde(default)]
    pub timestamp: String,
}

/// A submission the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub message_id: MessageId,
    pub created_at: String,
}

/// What a single status query saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptObservation {
    /// Terminal status; polling stops.
    Terminal { status: i64 },
    /// Record present with a non-terminal status.
    Pending { status: i64 },
    /// Query succeeded but carried no record for the id.
    NotReady,
    /// Query failed at the transport level.
    Transport(ClientError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollAttempt {
    pub message_id: MessageId,
    pub attempt: u32,
    pub observation: AttemptObservation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PollAttempt(PollAttempt),
    Submitted {
        submission_id: SubmissionId,
        result: Result<Submission, SubmitError>,
    },
    PollFinished {
        message_id: MessageId,
        result: Result<StatusRecord, PollError>,
    },
    HistoryLoaded {
        result: Result<Vec<HistoryMessage>, ClientError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    UnexpectedEnvelope { status: String },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::UnexpectedEnvelope { status } => {
                write!(f, "unexpected response status {status:?}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("message text is empty")]
    EmptyText,
    #[error("send failed: {0}")]
    Transport(#[from] ClientError),
    #[error("backend rejected message with status {status:?}")]
    Rejected { status: String },
    #[error("backend accepted message without an id")]
    MissingMessageId,
}

impl SubmitError {
    /// Transport faults versus answers from the backend.
    pub fn is_transport(&self) -> bool {
        matches!(self, SubmitError::Transport(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("polling timed out after {attempts} attempts")]
    Timeout {
        attempts: u32,
        last_failure: Option<ClientError>,
    },
    #[error("polling cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}
