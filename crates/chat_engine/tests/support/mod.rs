//! In-memory backend with scripted status answers, shared by engine tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chat_engine::{
    ChatBackend, ChatHistoryResponse, ClientError, EngineEvent, FailureKind, HistoryMessage,
    MessageId, MessagesStatusResponse, ProgressSink, SendMessageResponse, StatusRecord,
};

/// One scripted answer of the status endpoint for a single id.
#[derive(Debug, Clone)]
pub enum Step {
    Status(i64),
    Reply(i64, &'static str),
    Missing,
    Fault,
}

#[derive(Default)]
pub struct ScriptedBackend {
    scripts: Mutex<HashMap<MessageId, VecDeque<Step>>>,
    status_calls: Mutex<Vec<Vec<MessageId>>>,
    send_results: Mutex<VecDeque<Result<SendMessageResponse, ClientError>>>,
    sent: Mutex<Vec<String>>,
    history: Mutex<Option<Result<ChatHistoryResponse, ClientError>>>,
    query_delay: Mutex<Duration>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues status answers for `id`. Once the script runs dry the id stays
    /// under processing.
    pub fn script(&self, id: &str, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .extend(steps);
    }

    pub fn accept_next(&self, message_id: &str) {
        self.send_results
            .lock()
            .unwrap()
            .push_back(Ok(SendMessageResponse {
                status: "success".to_string(),
                message_id: Some(message_id.to_string()),
            }));
    }

    pub fn reject_next(&self, status: &str) {
        self.send_results
            .lock()
            .unwrap()
            .push_back(Ok(SendMessageResponse {
                status: status.to_string(),
                message_id: None,
            }));
    }

    /// Makes every status query take `delay` before it answers.
    pub fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock().unwrap() = delay;
    }

    pub fn set_history(&self, result: Result<ChatHistoryResponse, ClientError>) {
        *self.history.lock().unwrap() = Some(result);
    }

    /// Number of status queries that included `id`.
    pub fn queries_for(&self, id: &str) -> usize {
        self.status_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|ids| ids.iter().any(|queried| queried == id))
            .count()
    }

    pub fn total_queries(&self) -> usize {
        self.status_calls.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

pub fn network_fault() -> ClientError {
    ClientError {
        kind: FailureKind::Network,
        message: "connection reset".to_string(),
    }
}

#[async_trait::async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send_message(
        &self,
        _user_id: &str,
        message: &str,
    ) -> Result<SendMessageResponse, ClientError> {
        self.sent.lock().unwrap().push(message.to_string());
        self.send_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(network_fault()))
    }

    async fn messages_status(
        &self,
        _user_id: &str,
        message_ids: &[MessageId],
    ) -> Result<MessagesStatusResponse, ClientError> {
        self.status_calls.lock().unwrap().push(message_ids.to_vec());
        let delay = *self.query_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut scripts = self.scripts.lock().unwrap();
        let mut data = Vec::new();
        for id in message_ids {
            let step = scripts
                .get_mut(id)
                .and_then(|steps| steps.pop_front())
                .unwrap_or(Step::Status(5));
            match step {
                Step::Status(status) => data.push(StatusRecord {
                    id: id.clone(),
                    status,
                    system_response: None,
                }),
                Step::Reply(status, text) => data.push(StatusRecord {
                    id: id.clone(),
                    status,
                    system_response: Some(text.to_string()),
                }),
                Step::Missing => {}
                Step::Fault => return Err(network_fault()),
            }
        }
        Ok(MessagesStatusResponse {
            status: "success".to_string(),
            data,
        })
    }

    async fn get_chat(
        &self,
        _user_id: &str,
        _page_number: u32,
    ) -> Result<ChatHistoryResponse, ClientError> {
        self.history.lock().unwrap().clone().unwrap_or_else(|| {
            Ok(ChatHistoryResponse {
                status: "ok".to_string(),
                data: Vec::<HistoryMessage>::new(),
            })
        })
    }
}

/// Collects every event emitted during a poll.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
