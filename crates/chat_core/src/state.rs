use std::collections::{BTreeMap, HashMap};

use chat_logging::{chat_debug, chat_error, chat_warn};

use crate::view_model::{ChatViewModel, MessageRowView};

/// Opaque identifier issued by the backend when a message is accepted.
pub type MessageId = String;

/// Client-local key for a send that has not been acknowledged yet.
pub type SubmissionId = u64;

/// Processing status of a message, integer-coded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingStatus {
    #[default]
    UnderProcessing,
    Success,
    Error,
    /// A code outside 5/6/7, or no code at all. Kept as reported and never polled.
    Unknown(Option<i64>),
}

impl ProcessingStatus {
    pub const UNDER_PROCESSING_CODE: i64 = 5;
    pub const SUCCESS_CODE: i64 = 6;
    pub const ERROR_CODE: i64 = 7;

    pub fn from_code(code: i64) -> Self {
        match code {
            Self::UNDER_PROCESSING_CODE => Self::UnderProcessing,
            Self::SUCCESS_CODE => Self::Success,
            Self::ERROR_CODE => Self::Error,
            other => Self::Unknown(Some(other)),
        }
    }

    /// Like [`Self::from_code`], with a missing code decoded as `Unknown(None)`.
    pub fn from_optional_code(code: Option<i64>) -> Self {
        code.map_or(Self::Unknown(None), Self::from_code)
    }

    pub fn code(self) -> Option<i64> {
        match self {
            Self::UnderProcessing => Some(Self::UNDER_PROCESSING_CODE),
            Self::Success => Some(Self::SUCCESS_CODE),
            Self::Error => Some(Self::ERROR_CODE),
            Self::Unknown(code) => code,
        }
    }

    /// Only 6 and 7 end processing.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    /// Still waiting for the backend's reply; the only status the reconciler writes over.
    pub fn awaits_reply(self) -> bool {
        matches!(self, Self::UnderProcessing)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::UnderProcessing => "Processing...",
            Self::Success => "Completed",
            Self::Error => "Error",
            Self::Unknown(_) => "Unknown",
        }
    }
}

/// One user/system exchange in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub user_text: String,
    pub system_text: String,
    pub status: ProcessingStatus,
    pub created_at: String,
}

impl Message {
    /// A freshly submitted message awaiting its system response.
    pub fn pending(
        id: impl Into<MessageId>,
        user_text: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            user_text: user_text.into(),
            system_text: String::new(),
            status: ProcessingStatus::UnderProcessing,
            created_at: created_at.into(),
        }
    }
}

/// Why a send never produced a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionFailure {
    /// Backend answered but did not accept the message.
    Rejected,
    /// The request itself failed.
    Transport,
}

impl SubmissionFailure {
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Rejected => "Failed to send message. Please try again.",
            Self::Transport => {
                "Error sending message. Please check your connection and try again."
            }
        }
    }
}

/// Canonical client state: the append-only message ledger plus the
/// in-flight set. Mutated only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatState {
    messages: Vec<Message>,
    index: HashMap<MessageId, usize>,
    /// In-flight ids mapped to the number of finished poll attempts.
    in_flight: BTreeMap<MessageId, u32>,
    submissions: BTreeMap<SubmissionId, String>,
    next_submission_id: SubmissionId,
    loading_history: bool,
    input_closed: bool,
    last_error: Option<String>,
    dirty: bool,
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            next_submission_id: 1,
            ..Self::default()
        }
    }

    pub fn view(&self) -> ChatViewModel {
        let messages = self
            .messages
            .iter()
            .map(|message| {
                let attempts = self.in_flight.get(&message.id).copied();
                MessageRowView::from_message(message, attempts)
            })
            .collect();
        ChatViewModel {
            messages,
            in_flight: self.in_flight.len(),
            sending: !self.submissions.is_empty(),
            loading_history: self.loading_history,
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.index.get(id).map(|&pos| &self.messages[pos])
    }

    pub fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight.contains_key(id)
    }

    pub fn in_flight_ids(&self) -> Vec<MessageId> {
        self.in_flight.keys().cloned().collect()
    }

    pub fn pending_submissions(&self) -> usize {
        self.submissions.len()
    }

    /// Nothing is being sent, polled or loaded.
    pub fn is_idle(&self) -> bool {
        self.submissions.is_empty() && self.in_flight.is_empty() && !self.loading_history
    }

    pub fn input_closed(&self) -> bool {
        self.input_closed
    }

    /// Returns whether the state changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn start_history_load(&mut self) {
        self.loading_history = true;
        self.mark_dirty();
    }

    pub(crate) fn finish_history_load(&mut self) {
        self.loading_history = false;
        self.mark_dirty();
    }

    pub(crate) fn close_input(&mut self) {
        self.input_closed = true;
    }

    /// Registers a send for non-blank text. Returns the submission key and the
    /// trimmed text, or `None` when there is nothing to send.
    pub(crate) fn begin_submission(&mut self, raw: &str) -> Option<(SubmissionId, String)> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        let submission_id = self.next_submission_id;
        self.next_submission_id += 1;
        self.submissions.insert(submission_id, text.to_string());
        self.last_error = None;
        self.mark_dirty();
        Some((submission_id, text.to_string()))
    }

    /// Optimistic insert: appends an `UnderProcessing` message and marks it in
    /// flight. Returns `false` when nothing was inserted.
    pub(crate) fn accept_submission(
        &mut self,
        submission_id: SubmissionId,
        message_id: MessageId,
        created_at: String,
    ) -> bool {
        let Some(text) = self.submissions.remove(&submission_id) else {
            chat_error!(
                "acknowledgment for unknown submission {} (message {})",
                submission_id,
                message_id
            );
            return false;
        };
        self.mark_dirty();

        if self.index.contains_key(&message_id) {
            chat_warn!(
                "message {} already tracked; ignoring duplicate acknowledgment",
                message_id
            );
            return false;
        }

        self.push(Message::pending(message_id.clone(), text, created_at));
        self.in_flight.insert(message_id, 0);
        true
    }

    pub(crate) fn fail_submission(
        &mut self,
        submission_id: SubmissionId,
        failure: SubmissionFailure,
    ) {
        if self.submissions.remove(&submission_id).is_none() {
            chat_error!("failure reported for unknown submission {}", submission_id);
            return;
        }
        self.last_error = Some(failure.user_message().to_string());
        self.mark_dirty();
    }

    /// Merges a history page ahead of the messages created in this session.
    /// Returns the ids of merged messages that still need polling (code 5 and
    /// no reply yet); they are already marked in flight.
    pub(crate) fn merge_history(&mut self, history: Vec<Message>) -> Vec<MessageId> {
        let mut merged = Vec::with_capacity(history.len());
        for message in history {
            if self.index.contains_key(&message.id)
                || merged.iter().any(|m: &Message| m.id == message.id)
            {
                chat_debug!("history message {} already tracked", message.id);
                continue;
            }
            merged.push(message);
        }
        if merged.is_empty() {
            return Vec::new();
        }

        let resume: Vec<MessageId> = merged
            .iter()
            .filter(|message| message.status.awaits_reply() && message.system_text.is_empty())
            .map(|message| message.id.clone())
            .collect();
        for id in &resume {
            self.in_flight.insert(id.clone(), 0);
        }

        merged.append(&mut self.messages);
        self.messages = merged;
        self.rebuild_index();
        self.mark_dirty();
        resume
    }

    pub(crate) fn record_attempt(&mut self, message_id: &str, attempt: u32) {
        if let Some(attempts) = self.in_flight.get_mut(message_id) {
            if attempt > *attempts {
                *attempts = attempt;
                self.mark_dirty();
            }
        }
    }

    pub(crate) fn remove_in_flight(&mut self, message_id: &str) -> bool {
        let removed = self.in_flight.remove(message_id).is_some();
        if removed {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        let pos = *self.index.get(message_id)?;
        self.messages.get_mut(pos)
    }

    fn push(&mut self, message: Message) {
        self.index.insert(message.id.clone(), self.messages.len());
        self.messages.push(message);
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .messages
            .iter()
            .enumerate()
            .map(|(pos, message)| (message.id.clone(), pos))
            .collect();
    }
}
