//! Integration tests for chat-client.
//!
//! Each test spins up a local axum server that mimics the chat API, so no
//! external service is needed.

use axum::extract::{FromRequest, Multipart, Path, Query, Request};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chat_client::{ApiConfig, ChatClient};
use chat_core::{ChatApi, ChatError, OutgoingFile, PeerRole};
use serde_json::{json, Value};
use std::collections::HashMap;

const TOKEN: &str = "tok-1";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == format!("Bearer {}", TOKEN))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Invalid token").into_response()
}

fn message_json(id: &str, from: &str, text: &str) -> Value {
    json!({"_id": id, "from": from, "message": text, "timestamp": "2024-05-01T10:00:00Z"})
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] == "secret" {
        Json(json!({
            "token": TOKEN,
            "agent": {"id": "me", "name": "Me", "email": body["email"], "role": "agent"}
        }))
        .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "Bad credentials").into_response()
    }
}

async fn me(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"agent": {"_id": "me", "name": "Me", "role": "agent", "status": "active"}}))
        .into_response()
}

async fn agents(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let role = query.get("role").cloned().unwrap_or_else(|| "agent".to_string());
    Json(json!({"agents": [
        {"id": "p1", "name": "Ana", "email": "ana@example.com", "role": role},
        {"id": "p2", "name": "Bo", "email": "bo@example.com", "role": role}
    ]}))
    .into_response()
}

async fn conversations(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"conversations": [
        {"peer": {"id": "p1", "name": "Ana"}, "lastMessage": message_json("m1", "p1", "hi"), "unreadCount": 2},
        {"peer": {"_id": "p2", "name": "Bo"}, "unreadCount": 0}
    ]}))
    .into_response()
}

async fn thread(headers: HeaderMap, Path(peer_id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match peer_id.as_str() {
        "crash" => (StatusCode::INTERNAL_SERVER_ERROR, "<html>Internal</html>").into_response(),
        "garbled" => (StatusCode::OK, "not json").into_response(),
        "p1" => Json(json!({
            "peer": {"id": "p1", "name": "Ana"},
            "messages": [message_json("m1", "p1", "hi"), message_json("m2", "me", "hello")]
        }))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, "Peer not found").into_response(),
    }
}

/// Echoes how the message arrived: `json:<text>` or `multipart:<files>:<text>`.
async fn send(Path(peer_id): Path<String>, request: Request) -> Response {
    if !authorized(request.headers()) {
        return unauthorized();
    }
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let body = if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &()).await.unwrap();
        let mut text = String::new();
        let mut files = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            if name == "message" {
                text = field.text().await.unwrap();
            } else if name == "files" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mime = field.content_type().unwrap_or_default().to_string();
                let len = field.bytes().await.unwrap().len();
                files.push(format!("{}|{}|{}", file_name, mime, len));
            }
        }
        format!("multipart:{}:{}", files.join(","), text)
    } else {
        let Json(value) = Json::<Value>::from_request(request, &()).await.unwrap();
        format!("json:{}", value["message"].as_str().unwrap_or_default())
    };

    Json(json!({"message": {
        "_id": "new",
        "from": "me",
        "to": peer_id,
        "message": body,
        "timestamp": "2024-05-01T10:05:00Z"
    }}))
    .into_response()
}

fn router() -> Router {
    Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/agents", get(agents))
        .route("/api/v1/chats/agents", get(conversations))
        .route("/api/v1/chats/agents/:peer_id", get(thread).post(send))
}

async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });
    format!("http://{}/api/v1", addr)
}

async fn authed_client() -> ChatClient {
    let base = spawn_server().await;
    ChatClient::new(ApiConfig::with_token(base, TOKEN)).unwrap()
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_stores_token() {
        let base = spawn_server().await;
        let (client, agent) = ChatClient::login(ApiConfig::new(base), "me@example.com", "secret")
            .await
            .unwrap();
        assert!(client.is_authenticated());
        assert_eq!(agent.id, "me");
        assert_eq!(agent.email, "me@example.com");

        let me = client.me().await.unwrap();
        assert_eq!(me.id, "me");
        assert_eq!(me.role, Some(PeerRole::Agent));
    }

    #[tokio::test]
    async fn test_bad_credentials_map_to_auth() {
        let base = spawn_server().await;
        let result = ChatClient::login(ApiConfig::new(base), "me@example.com", "wrong").await;
        match result {
            Err(ChatError::Auth(body)) => assert_eq!(body, "Bad credentials"),
            other => panic!("Unexpected result: {:?}", other.map(|(_, a)| a)),
        }
    }

    #[tokio::test]
    async fn test_wrong_token_maps_to_auth() {
        let base = spawn_server().await;
        let client = ChatClient::new(ApiConfig::with_token(base, "stale")).unwrap();
        assert!(matches!(client.me().await, Err(ChatError::Auth(_))));
    }
}

mod read_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_peers_sends_role_filter() {
        let client = authed_client().await;
        let peers = client.list_peers(Some(PeerRole::SuperAgent)).await.unwrap();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].name, "Ana");
        assert_eq!(peers[0].role, Some(PeerRole::SuperAgent));
    }

    #[tokio::test]
    async fn test_list_conversation_summaries() {
        let client = authed_client().await;
        let summaries = client.list_conversation_summaries().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].peer_id(), Some("p1"));
        assert_eq!(summaries[0].unread_count, 2);
        assert_eq!(summaries[0].last_message.as_ref().unwrap().id, "m1");
        assert_eq!(summaries[1].peer_id(), Some("p2"));
    }

    #[tokio::test]
    async fn test_get_thread_keeps_server_order() {
        let client = authed_client().await;
        let thread = client.get_thread("p1").await.unwrap();
        assert_eq!(thread.peer.name, "Ana");
        let ids: Vec<_> = thread.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }
}

mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_not_found_surfaces_raw_body() {
        let client = authed_client().await;
        match client.get_thread("nobody").await {
            Err(ChatError::Request { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "Peer not found");
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_parsed_as_json() {
        let client = authed_client().await;
        match client.get_thread("crash").await {
            Err(ChatError::Request { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "<html>Internal</html>");
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_garbled_success_is_decode_error() {
        let client = authed_client().await;
        assert!(matches!(
            client.get_thread("garbled").await,
            Err(ChatError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let client =
            ChatClient::new(ApiConfig::with_token("http://127.0.0.1:1/api/v1", TOKEN)).unwrap();
        let err = client.get_thread("p1").await.unwrap_err();
        assert!(matches!(err, ChatError::Network(_)));
        assert!(err.is_retryable());
    }
}

mod send_tests {
    use super::*;

    #[tokio::test]
    async fn test_text_message_uses_json() {
        let client = authed_client().await;
        let message = client.send_message("p1", "hello").await.unwrap();
        assert_eq!(message.body, "json:hello");
        assert_eq!(message.to.unwrap().id, "p1");
    }

    #[tokio::test]
    async fn test_attachments_use_multipart() {
        let client = authed_client().await;
        let files = vec![
            OutgoingFile::new("photo.png", vec![0u8; 4]),
            OutgoingFile::new("notes.txt", b"abc".to_vec()),
        ];
        let message = client
            .send_message_with_attachments("p1", Some("look"), files)
            .await
            .unwrap();
        assert_eq!(
            message.body,
            "multipart:photo.png|image/png|4,notes.txt|text/plain|3:look"
        );
    }

    #[tokio::test]
    async fn test_attachment_only_omits_message_field() {
        let client = authed_client().await;
        let files = vec![OutgoingFile::new("report.pdf", vec![1, 2])];
        let message = client
            .send_message_with_attachments("p1", None, files)
            .await
            .unwrap();
        assert_eq!(message.body, "multipart:report.pdf|application/pdf|2:");
    }
}
