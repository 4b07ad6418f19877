use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use chat_logging::{chat_debug, chat_error, chat_info};
use tokio_util::sync::CancellationToken;

use crate::{
    load_history, submit_message, ChannelProgressSink, ChatBackend, ClientError, EngineConfig,
    EngineEvent, MessageId, ReqwestChatBackend, StatusPoller, Submission, SubmissionId,
};

enum EngineCommand {
    Submit {
        submission_id: SubmissionId,
        text: String,
    },
    Poll {
        message_id: MessageId,
    },
    Cancel {
        message_id: MessageId,
    },
    LoadHistory {
        page: u32,
    },
}

/// Live polls keyed by message id. Used for deduplication and cancellation only.
type PollRegistry = Arc<Mutex<HashMap<MessageId, CancellationToken>>>;

struct Worker {
    backend: Arc<dyn ChatBackend>,
    poller: StatusPoller,
    user_id: Arc<str>,
    created_utc: Arc<dyn Fn() -> String + Send + Sync>,
    polls: PollRegistry,
    shutdown: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
}

/// Runs backend IO on a dedicated tokio runtime thread. Commands go in
/// through the handle, results come back as [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    shutdown: CancellationToken,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, ClientError> {
        let backend = ReqwestChatBackend::new(&config.base_url, &config.client)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    pub fn with_backend(config: EngineConfig, backend: Arc<dyn ChatBackend>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let shutdown = CancellationToken::new();

        let worker = Arc::new(Worker {
            backend,
            poller: StatusPoller::new(config.poll),
            user_id: Arc::from(config.user_id.as_str()),
            created_utc: config.created_utc.clone(),
            polls: Arc::new(Mutex::new(HashMap::new())),
            shutdown: shutdown.clone(),
            event_tx,
        });

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                worker.handle_command(&runtime, command);
            }
            // Handle dropped: stop every live poll before the runtime goes away.
            worker.shutdown.cancel();
            runtime.shutdown_timeout(Duration::from_secs(1));
        });

        Self {
            cmd_tx,
            event_rx,
            shutdown,
        }
    }

    pub fn submit(&self, submission_id: SubmissionId, text: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            submission_id,
            text: text.into(),
        });
    }

    /// Starts polling `message_id`. Ignored while a poll for it is live.
    pub fn poll(&self, message_id: impl Into<MessageId>) {
        let _ = self.cmd_tx.send(EngineCommand::Poll {
            message_id: message_id.into(),
        });
    }

    pub fn cancel(&self, message_id: impl Into<MessageId>) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel {
            message_id: message_id.into(),
        });
    }

    pub fn load_history(&self, page: u32) {
        let _ = self.cmd_tx.send(EngineCommand::LoadHistory { page });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Cancels every live poll. Each reports a cancelled result.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl Worker {
    fn handle_command(self: &Arc<Self>, runtime: &tokio::runtime::Runtime, command: EngineCommand) {
        match command {
            EngineCommand::Submit {
                submission_id,
                text,
            } => {
                let worker = Arc::clone(self);
                runtime.spawn(async move {
                    let result = submit_message(worker.backend.as_ref(), &worker.user_id, &text)
                        .await
                        .map(|message_id| Submission {
                            message_id,
                            created_at: (worker.created_utc)(),
                        });
                    let _ = worker.event_tx.send(EngineEvent::Submitted {
                        submission_id,
                        result,
                    });
                });
            }
            EngineCommand::Poll { message_id } => {
                let Some(cancel) = self.register_poll(&message_id) else {
                    chat_debug!("poll for message {} already running", message_id);
                    return;
                };
                let worker = Arc::clone(self);
                runtime.spawn(async move {
                    let sink = ChannelProgressSink::new(worker.event_tx.clone());
                    let result = worker
                        .poller
                        .poll(
                            worker.backend.as_ref(),
                            &worker.user_id,
                            &message_id,
                            &cancel,
                            &sink,
                        )
                        .await;
                    worker.release_poll(&message_id);
                    let _ = worker
                        .event_tx
                        .send(EngineEvent::PollFinished { message_id, result });
                });
            }
            EngineCommand::Cancel { message_id } => {
                let polls = self.polls.lock().unwrap_or_else(PoisonError::into_inner);
                match polls.get(&message_id) {
                    Some(token) => token.cancel(),
                    None => chat_debug!("no live poll for message {} to cancel", message_id),
                }
            }
            EngineCommand::LoadHistory { page } => {
                let worker = Arc::clone(self);
                runtime.spawn(async move {
                    let result = load_history(worker.backend.as_ref(), &worker.user_id, page).await;
                    if let Err(err) = &result {
                        chat_error!("history load failed: {}", err);
                    }
                    let _ = worker.event_tx.send(EngineEvent::HistoryLoaded { result });
                });
            }
        }
    }

    /// Returns a token for a new poll, or `None` if one is already live.
    fn register_poll(&self, message_id: &str) -> Option<CancellationToken> {
        let mut polls = self.polls.lock().unwrap_or_else(PoisonError::into_inner);
        if polls.contains_key(message_id) {
            return None;
        }
        let token = self.shutdown.child_token();
        polls.insert(message_id.to_string(), token.clone());
        chat_info!("polling message {} ({} live)", message_id, polls.len());
        Some(token)
    }

    fn release_poll(&self, message_id: &str) {
        let mut polls = self.polls.lock().unwrap_or_else(PoisonError::into_inner);
        polls.remove(message_id);
    }
}
