use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::{
    ChatHistoryResponse, ClientError, FailureKind, MessageId, MessagesStatusRequest,
    MessagesStatusResponse, SendMessageRequest, SendMessageResponse,
};

const SEND_MESSAGE_PATH: &str = "/api/chat/sendMessage";
const MESSAGES_STATUS_PATH: &str = "/api/chat/getMessagesStatus";
const GET_CHAT_PATH: &str = "/api/chat/getChat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Backend chat endpoints. Responses are returned as received; callers
/// decide what an envelope status means.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_message(
        &self,
        user_id: &str,
        message: &str,
    ) -> Result<SendMessageResponse, ClientError>;

    async fn messages_status(
        &self,
        user_id: &str,
        message_ids: &[MessageId],
    ) -> Result<MessagesStatusResponse, ClientError>;

    async fn get_chat(
        &self,
        user_id: &str,
        page_number: u32,
    ) -> Result<ChatHistoryResponse, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestChatBackend {
    client: reqwest::Client,
    send_url: Url,
    status_url: Url,
    history_url: Url,
}

impl ReqwestChatBackend {
    pub fn new(base_url: &str, settings: &ClientSettings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            send_url: endpoint(base_url, SEND_MESSAGE_PATH)?,
            status_url: endpoint(base_url, MESSAGES_STATUS_PATH)?,
            history_url: endpoint(base_url, GET_CHAT_PATH)?,
        })
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let body = response.text().await.map_err(map_reqwest_error)?;
        serde_json::from_str(&body)
            .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl ChatBackend for ReqwestChatBackend {
    async fn send_message(
        &self,
        user_id: &str,
        message: &str,
    ) -> Result<SendMessageResponse, ClientError> {
        let response = self
            .client
            .post(self.send_url.clone())
            .json(&SendMessageRequest { user_id, message })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_json(response).await
    }

    async fn messages_status(
        &self,
        user_id: &str,
        message_ids: &[MessageId],
    ) -> Result<MessagesStatusResponse, ClientError> {
        let response = self
            .client
            .post(self.status_url.clone())
            .json(&MessagesStatusRequest {
                user_id,
                message_ids,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_json(response).await
    }

    async fn get_chat(
        &self,
        user_id: &str,
        page_number: u32,
    ) -> Result<ChatHistoryResponse, ClientError> {
        let mut url = self.history_url.clone();
        url.query_pairs_mut()
            .append_pair("user_id", user_id)
            .append_pair("page_number", &page_number.to_string());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_json(response).await
    }
}

/// Appends an API path to the base url, keeping any path prefix the base has.
fn endpoint(base_url: &str, path: &str) -> Result<Url, ClientError> {
    let joined = format!("{}{}", base_url.trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ClientError::new(FailureKind::Decode, err.to_string());
    }
    if err.is_builder() {
        return ClientError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ClientError::new(FailureKind::Network, err.to_string())
}
