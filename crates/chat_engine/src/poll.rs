use std::time::Duration;

use chat_logging::{chat_debug, chat_info, chat_warn};
use tokio_util::sync::CancellationToken;

use crate::{
    AttemptObservation, ChatBackend, ClientError, EngineEvent, MessagesStatusResponse,
    PollAttempt, PollError, StatusRecord,
};

const STATUS_OK: &str = "success";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Shared budget for failed, empty and non-terminal attempts.
    pub max_attempts: u32,
    /// Delay between two consecutive attempts.
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_millis(10_000),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Polls the status endpoint for one message until it turns terminal, the
/// attempt budget runs out, or the token is cancelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusPoller {
    settings: PollSettings,
}

impl StatusPoller {
    pub fn new(settings: PollSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Wall-clock limit for one poll: `interval x max_attempts`. A zero
    /// interval leaves the poll bounded by the attempt budget alone.
    pub fn time_budget(&self) -> Duration {
        self.settings
            .interval
            .saturating_mul(self.settings.max_attempts.max(1))
    }

    pub async fn poll(
        &self,
        backend: &dyn ChatBackend,
        user_id: &str,
        message_id: &str,
        cancel: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> Result<StatusRecord, PollError> {
        let budget = self.time_budget();
        let mut tally = AttemptTally::default();
        let attempts = self.run_attempts(backend, user_id, message_id, cancel, sink, &mut tally);
        if budget.is_zero() {
            return attempts.await;
        }

        let bounded = tokio::time::timeout(budget, attempts).await;
        match bounded {
            Ok(result) => result,
            Err(_) => {
                chat_warn!(
                    "gave up on message {} after {:?} ({} attempts finished)",
                    message_id,
                    budget,
                    tally.completed
                );
                Err(PollError::Timeout {
                    attempts: tally.completed,
                    last_failure: tally.last_failure,
                })
            }
        }
    }

    async fn run_attempts(
        &self,
        backend: &dyn ChatBackend,
        user_id: &str,
        message_id: &str,
        cancel: &CancellationToken,
        sink: &dyn ProgressSink,
        tally: &mut AttemptTally,
    ) -> Result<StatusRecord, PollError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let ids = [message_id.to_string()];

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                // The sleep future is dropped on cancellation; no timer outlives the poll.
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(cancelled(message_id, tally.completed)),
                    _ = tokio::time::sleep(self.settings.interval) => {}
                }
            }
            if cancel.is_cancelled() {
                return Err(cancelled(message_id, tally.completed));
            }

            let (observation, record) = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(message_id, tally.completed)),
                result = backend.messages_status(user_id, &ids) => classify(message_id, result),
            };
            tally.completed = attempt;

            match &observation {
                AttemptObservation::Terminal { status } => {
                    chat_info!(
                        "message {} terminal with code {} at attempt {}",
                        message_id,
                        status,
                        attempt
                    );
                }
                AttemptObservation::Pending { status } => {
                    chat_debug!(
                        "message {} pending (code {}) at attempt {}/{}",
                        message_id,
                        status,
                        attempt,
                        max_attempts
                    );
                }
                AttemptObservation::NotReady => {
                    chat_debug!(
                        "no status for message {} yet at attempt {}/{}",
                        message_id,
                        attempt,
                        max_attempts
                    );
                }
                AttemptObservation::Transport(err) => {
                    chat_warn!(
                        "status query for message {} failed at attempt {}/{}: {}",
                        message_id,
                        attempt,
                        max_attempts,
                        err
                    );
                    tally.last_failure = Some(err.clone());
                }
            }

            sink.emit(EngineEvent::PollAttempt(PollAttempt {
                message_id: message_id.to_string(),
                attempt,
                observation,
            }));

            if let Some(record) = record {
                return Ok(record);
            }
        }

        chat_warn!(
            "gave up on message {} after {} attempts",
            message_id,
            max_attempts
        );
        Err(PollError::Timeout {
            attempts: max_attempts,
            last_failure: tally.last_failure.take(),
        })
    }
}

/// Finished attempts of one poll, kept outside the attempt loop so a poll cut
/// short by its time budget can still report them.
#[derive(Debug, Default)]
struct AttemptTally {
    completed: u32,
    last_failure: Option<ClientError>,
}

fn cancelled(message_id: &str, attempts: u32) -> PollError {
    chat_info!(
        "polling for message {} cancelled after {} attempts",
        message_id,
        attempts
    );
    PollError::Cancelled { attempts }
}

/// Sorts one query result into an observation, plus the record when terminal.
fn classify(
    message_id: &str,
    result: Result<MessagesStatusResponse, ClientError>,
) -> (AttemptObservation, Option<StatusRecord>) {
    let response = match result {
        Ok(response) => response,
        Err(err) => return (AttemptObservation::Transport(err), None),
    };
    if response.status != STATUS_OK {
        return (AttemptObservation::NotReady, None);
    }
    match response
        .data
        .into_iter()
        .find(|record| record.id == message_id)
    {
        Some(record) if record.is_terminal() => (
            AttemptObservation::Terminal {
                status: record.status,
            },
            Some(record),
        ),
        Some(record) => (
            AttemptObservation::Pending {
                status: record.status,
            },
            None,
        ),
        None => (AttemptObservation::NotReady, None),
    }
}
