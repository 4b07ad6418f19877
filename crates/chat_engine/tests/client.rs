use std::time::Duration;

use chat_engine::{
    load_history, ChatBackend, ClientSettings, FailureKind, HistoryMessage, ReqwestChatBackend,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> ReqwestChatBackend {
    ReqwestChatBackend::new(&server.uri(), &ClientSettings::default()).expect("backend")
}

#[tokio::test]
async fn send_message_posts_user_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/sendMessage"))
        .and(body_json(json!({"user_id": "u-1", "message": "hello"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "success", "message_id": "m-1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = backend(&server).send_message("u-1", "hello").await.unwrap();
    assert_eq!(response.status, "success");
    assert_eq!(response.message_id.as_deref(), Some("m-1"));
}

#[tokio::test]
async fn messages_status_sends_batched_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/getMessagesStatus"))
        .and(body_json(json!({"user_id": "u-1", "message_ids": ["a", "b"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": [
                {"id": "a", "status": 6, "system_response": "done"},
                {"id": "b", "status": 5}
            ]
        })))
        .mount(&server)
        .await;

    let ids = vec!["a".to_string(), "b".to_string()];
    let response = backend(&server).messages_status("u-1", &ids).await.unwrap();

    assert_eq!(response.data.len(), 2);
    assert!(response.data[0].is_terminal());
    assert_eq!(response.data[0].system_response.as_deref(), Some("done"));
    assert!(!response.data[1].is_terminal());
    assert_eq!(response.data[1].system_response, None);
}

#[tokio::test]
async fn history_uses_query_parameters_and_fills_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/getChat"))
        .and(query_param("user_id", "u-1"))
        .and(query_param("page_number", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "data": [
                {
                    "id": "h-1",
                    "user_message": "hi",
                    "system_message": "hello",
                    "system_message_status": 6,
                    "timestamp": "2026-10-17T09:00:00Z"
                },
                {"id": "h-2", "user_message": "pending?"}
            ]
        })))
        .mount(&server)
        .await;

    let history = load_history(&backend(&server), "u-1", 1).await.unwrap();
    assert_eq!(
        history,
        vec![
            HistoryMessage {
                id: "h-1".into(),
                user_message: "hi".into(),
                system_message: "hello".into(),
                system_message_status: Some(6),
                timestamp: "2026-10-17T09:00:00Z".into(),
            },
            HistoryMessage {
                id: "h-2".into(),
                user_message: "pending?".into(),
                system_message: String::new(),
                system_message_status: None,
                timestamp: String::new(),
            },
        ]
    );
}

#[tokio::test]
async fn history_with_unexpected_envelope_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/getChat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "error"})))
        .mount(&server)
        .await;

    let err = load_history(&backend(&server), "u-1", 1).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnexpectedEnvelope {
            status: "error".to_string()
        }
    );
}

#[tokio::test]
async fn http_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/getMessagesStatus"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = backend(&server)
        .messages_status("u-1", &["a".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}

#[tokio::test]
async fn malformed_body_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = backend(&server).send_message("u-1", "hi").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/sendMessage"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"status": "success", "message_id": "m-1"})),
        )
        .mount(&server)
        .await;

    let settings = ClientSettings {
        request_timeout: Duration::from_millis(50),
        ..ClientSettings::default()
    };
    let backend = ReqwestChatBackend::new(&server.uri(), &settings).unwrap();

    let err = backend.send_message("u-1", "hi").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_failure() {
    // Port 9 (discard) is expected to refuse connections on test hosts.
    let backend =
        ReqwestChatBackend::new("http://127.0.0.1:9", &ClientSettings::default()).unwrap();
    let err = backend.send_message("u-1", "hi").await.unwrap_err();
    assert!(matches!(err.kind, FailureKind::Network | FailureKind::Timeout));
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ReqwestChatBackend::new("not a url", &ClientSettings::default()).unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
