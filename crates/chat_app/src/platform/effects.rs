use chat_core::{Effect, Message, Msg, Outcome, ProcessingStatus, SubmissionFailure};
use chat_engine::{EngineEvent, EngineHandle, HistoryMessage, PollError, StatusRecord};
use chat_logging::{chat_debug, chat_info, chat_warn};

/// What the app loop should do after a batch of effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) -> Flow {
        let mut flow = Flow::Continue;
        for effect in effects {
            match effect {
                Effect::LoadHistory { page } => self.engine.load_history(page),
                Effect::SendMessage {
                    submission_id,
                    text,
                } => {
                    chat_info!(
                        "SendMessage submission_id={} text_len={}",
                        submission_id,
                        text.len()
                    );
                    self.engine.submit(submission_id, text);
                }
                Effect::StartPolling { message_id } => self.engine.poll(message_id),
                Effect::CancelPolling { message_id } => {
                    chat_info!("cancelling poll for message {}", message_id);
                    self.engine.cancel(message_id);
                }
                Effect::Quit => flow = Flow::Quit,
            }
        }
        flow
    }

    /// Next engine event already translated into a core message.
    pub fn next_msg(&self) -> Option<Msg> {
        self.engine.try_recv().map(engine_event_to_msg)
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

pub fn engine_event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::PollAttempt(attempt) => Msg::PollProgress {
            message_id: attempt.message_id,
            attempt: attempt.attempt,
        },
        EngineEvent::Submitted {
            submission_id,
            result,
        } => match result {
            Ok(submission) => Msg::SubmissionAccepted {
                submission_id,
                message_id: submission.message_id,
                created_at: submission.created_at,
            },
            Err(err) => {
                chat_warn!("submission {} failed: {}", submission_id, err);
                let failure = if err.is_transport() {
                    SubmissionFailure::Transport
                } else {
                    SubmissionFailure::Rejected
                };
                Msg::SubmissionFailed {
                    submission_id,
                    failure,
                }
            }
        },
        EngineEvent::PollFinished { message_id, result } => {
            let outcome = map_poll_result(result);
            Msg::PollResolved {
                message_id,
                outcome,
            }
        }
        EngineEvent::HistoryLoaded { result } => match result {
            Ok(history) => Msg::HistoryLoaded(history.into_iter().map(history_message).collect()),
            Err(_) => Msg::HistoryFailed,
        },
    }
}

fn map_poll_result(result: Result<StatusRecord, PollError>) -> Outcome {
    match result {
        Ok(record) => {
            let status = ProcessingStatus::from_code(record.status);
            if status == ProcessingStatus::Error {
                Outcome::Failure {
                    status,
                    detail: record.system_response,
                }
            } else {
                Outcome::Success {
                    system_text: record.system_response.unwrap_or_default(),
                    status,
                }
            }
        }
        Err(PollError::Timeout {
            attempts,
            last_failure,
        }) => {
            if let Some(failure) = last_failure {
                chat_debug!("last failure after {} attempts: {}", attempts, failure);
            }
            Outcome::Timeout
        }
        Err(PollError::Cancelled { .. }) => Outcome::Cancelled,
    }
}

fn history_message(entry: HistoryMessage) -> Message {
    Message {
        id: entry.id,
        user_text: entry.user_message,
        system_text: entry.system_message,
        status: ProcessingStatus::from_optional_code(entry.system_message_status),
        created_at: entry.timestamp,
    }
}
