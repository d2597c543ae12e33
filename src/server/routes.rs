//! HTTP route handlers for the Supportline API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};

use crate::support::core::conversation::Conversation;
use crate::support::core::message::{Direction, Message};

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/conversations", get(list_conversations))
        .route("/conversations/{id}/messages", get(conversation_messages))
        .route("/messages/send", post(send_message))
        .route("/webhooks/whatsapp", post(whatsapp_webhook))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "supportline",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// List all conversations, newest-updated first.
async fn list_conversations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Conversation>>, (StatusCode, String)> {
    let conversations = state
        .conversations
        .list()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Storage error: {e}")))?;
    Ok(Json(conversations))
}

/// List a conversation's messages in creation order.
///
/// The id is treated as an opaque string; an unknown id yields an empty
/// array, not an error.
async fn conversation_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, (StatusCode, String)> {
    let messages = state
        .messages
        .list_for_conversation(&id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Storage error: {e}")))?;
    Ok(Json(messages))
}

/// Outbound send request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Recipient address.
    pub to: String,
    /// Optional text body.
    pub body: Option<String>,
    /// Optional media reference (URL).
    pub media_url: Option<String>,
}

/// Outbound send response.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    /// Always true on success.
    pub ok: bool,
    /// Provider-assigned message identifier.
    pub sid: String,
    /// The persisted outbound message.
    pub message: Message,
}

/// Handle outbound send requests.
///
/// The provider is called first; if it rejects the send, nothing is
/// persisted and the provider's error surfaces to the caller.
async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, (StatusCode, String)> {
    if request.to.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "missing recipient".to_string()));
    }

    let receipt = state
        .provider
        .send(
            &state.sender,
            &request.to,
            request.body.as_deref(),
            request.media_url.as_deref(),
        )
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, format!("Provider error: {e}")))?;

    let conversation = state
        .manager
        .ensure(&request.to)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Storage error: {e}")))?;
    let message = state
        .recorder
        .record(
            conversation.id,
            Direction::Outbound,
            &state.sender,
            &request.to,
            request.body,
            request.media_url,
        )
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Storage error: {e}")))?;

    tracing::info!(to = %request.to, sid = %receipt.sid, "outbound message sent");

    Ok(Json(SendMessageResponse {
        ok: true,
        sid: receipt.sid,
        message,
    }))
}

/// Inbound webhook payload (form-encoded by the provider).
///
/// Only the first media item is captured; additional `MediaUrlN` fields are
/// dropped.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    /// Sender address.
    #[serde(rename = "From", default)]
    pub from: String,
    /// Recipient address (our provider number).
    #[serde(rename = "To", default)]
    pub to: String,
    /// Optional text body.
    #[serde(rename = "Body", default)]
    pub body: Option<String>,
    /// First media item, if any.
    #[serde(rename = "MediaUrl0", default)]
    pub media_url: Option<String>,
}

/// Handle the provider's inbound message callback.
///
/// A storage failure surfaces as an error response; the provider applies its
/// own retry policy.
async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<WebhookPayload>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let body = payload.body.filter(|s| !s.is_empty());
    let media_url = payload.media_url.filter(|s| !s.is_empty());

    let conversation = state
        .manager
        .ensure(&payload.from)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Storage error: {e}")))?;
    state
        .recorder
        .record(
            conversation.id,
            Direction::Inbound,
            &payload.from,
            &payload.to,
            body,
            media_url,
        )
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Storage error: {e}")))?;

    tracing::info!(participant = %payload.from, "inbound message recorded");

    Ok(Json(serde_json::json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use crate::provider::{MessagingProvider, ProviderError, ProviderReceipt};
    use crate::support::core::config::StorageConfig;
    use crate::support::core::conversation::ConversationStatus;
    use crate::support::storage::{SqliteConversationStore, SqliteMessageStore};

    const STUB_SID: &str = "SM00000000000000000000000000000001";

    /// Provider stub: succeeds with a fixed sid, or rejects every send.
    struct StubProvider {
        fail: bool,
    }

    #[async_trait]
    impl MessagingProvider for StubProvider {
        async fn send(
            &self,
            _from: &str,
            to: &str,
            _body: Option<&str>,
            _media_url: Option<&str>,
        ) -> Result<ProviderReceipt, ProviderError> {
            if self.fail {
                return Err(ProviderError::Rejected {
                    status: 400,
                    message: format!("Invalid 'To' phone number: {to}"),
                });
            }
            Ok(ProviderReceipt {
                sid: STUB_SID.to_string(),
            })
        }
    }

    async fn test_router(fail_sends: bool) -> Router {
        let config = StorageConfig {
            sqlite_path: ":memory:".into(),
            ..StorageConfig::default()
        };
        let conversations = Arc::new(SqliteConversationStore::new(&config).await.unwrap());
        let messages = Arc::new(SqliteMessageStore::new(&config).await.unwrap());
        let state = Arc::new(AppState::assemble(
            conversations,
            messages,
            Arc::new(StubProvider { fail: fail_sends }),
            "whatsapp:+15550009999".to_string(),
        ));
        create_router(state)
    }

    async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post(router: &Router, uri: &str, content_type: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    const FORM: &str = "application/x-www-form-urlencoded";
    const JSON: &str = "application/json";

    #[tokio::test]
    async fn test_health_reports_service_name() {
        let router = test_router(false).await;
        let (status, json) = get_json(&router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "supportline");
    }

    #[tokio::test]
    async fn test_webhook_creates_conversation_and_inbound_message() {
        let router = test_router(false).await;

        let (status, bytes) = post(
            &router,
            "/webhooks/whatsapp",
            FORM,
            "From=%2B15551112222&To=%2B15550009999&Body=Hello",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let ack: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ack["ok"], true);

        let (_, conversations) = get_json(&router, "/conversations").await;
        let conversations: Vec<Conversation> =
            serde_json::from_value(conversations).unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].participant, "+15551112222");
        assert_eq!(conversations[0].status, ConversationStatus::Open);

        let uri = format!("/conversations/{}/messages", conversations[0].id);
        let (_, messages) = get_json(&router, &uri).await;
        let messages: Vec<Message> = serde_json::from_value(messages).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].direction, Direction::Inbound);
        assert_eq!(messages[0].sender, "+15551112222");
        assert_eq!(messages[0].recipient, "+15550009999");
        assert_eq!(messages[0].body.as_deref(), Some("Hello"));
        assert!(messages[0].media_url.is_none());
    }

    #[tokio::test]
    async fn test_webhook_repeated_sender_reuses_conversation() {
        let router = test_router(false).await;
        for body in ["Hello", "Are you there?"] {
            let payload = format!("From=%2B15551112222&To=%2B15550009999&Body={body}");
            let (status, _) = post(&router, "/webhooks/whatsapp", FORM, &payload).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, conversations) = get_json(&router, "/conversations").await;
        let conversations: Vec<Conversation> =
            serde_json::from_value(conversations).unwrap();
        assert_eq!(conversations.len(), 1);

        let uri = format!("/conversations/{}/messages", conversations[0].id);
        let (_, messages) = get_json(&router, &uri).await;
        let messages: Vec<Message> = serde_json::from_value(messages).unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_webhook_without_body_or_media_still_records() {
        let router = test_router(false).await;
        // Body present but empty mirrors the provider sending blank fields.
        let (status, _) = post(
            &router,
            "/webhooks/whatsapp",
            FORM,
            "From=%2B15551112222&To=%2B15550009999&Body=",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, conversations) = get_json(&router, "/conversations").await;
        let conversations: Vec<Conversation> =
            serde_json::from_value(conversations).unwrap();
        let uri = format!("/conversations/{}/messages", conversations[0].id);
        let (_, messages) = get_json(&router, &uri).await;
        let messages: Vec<Message> = serde_json::from_value(messages).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].body.is_none());
        assert!(messages[0].media_url.is_none());
    }

    #[tokio::test]
    async fn test_webhook_captures_first_media_item() {
        let router = test_router(false).await;
        let (status, _) = post(
            &router,
            "/webhooks/whatsapp",
            FORM,
            "From=%2B15551112222&To=%2B15550009999&MediaUrl0=https%3A%2F%2Fexample.com%2Fcat.jpg&MediaUrl1=https%3A%2F%2Fexample.com%2Fdog.jpg",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, conversations) = get_json(&router, "/conversations").await;
        let conversations: Vec<Conversation> =
            serde_json::from_value(conversations).unwrap();
        let uri = format!("/conversations/{}/messages", conversations[0].id);
        let (_, messages) = get_json(&router, &uri).await;
        let messages: Vec<Message> = serde_json::from_value(messages).unwrap();
        assert_eq!(
            messages[0].media_url.as_deref(),
            Some("https://example.com/cat.jpg")
        );
    }

    #[tokio::test]
    async fn test_send_returns_receipt_and_persists_outbound() {
        let router = test_router(false).await;

        let (status, bytes) = post(
            &router,
            "/messages/send",
            JSON,
            r#"{"to": "+15551112222", "body": "Hi there"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let response: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(response["ok"], true);
        assert_eq!(response["sid"], STUB_SID);
        assert_eq!(response["message"]["direction"], "outbound");

        let (_, conversations) = get_json(&router, "/conversations").await;
        let conversations: Vec<Conversation> =
            serde_json::from_value(conversations).unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].participant, "+15551112222");

        let uri = format!("/conversations/{}/messages", conversations[0].id);
        let (_, messages) = get_json(&router, &uri).await;
        let messages: Vec<Message> = serde_json::from_value(messages).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].direction, Direction::Outbound);
        assert_eq!(messages[0].sender, "whatsapp:+15550009999");
        assert_eq!(messages[0].recipient, "+15551112222");
        assert_eq!(messages[0].body.as_deref(), Some("Hi there"));
    }

    #[tokio::test]
    async fn test_send_provider_failure_records_nothing() {
        let router = test_router(true).await;

        let (status, bytes) = post(
            &router,
            "/messages/send",
            JSON,
            r#"{"to": "+15551112222", "body": "Hi there"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let error = String::from_utf8(bytes).unwrap();
        assert!(error.contains("Invalid 'To' phone number"));

        // Neither a conversation nor a message was persisted.
        let (_, conversations) = get_json(&router, "/conversations").await;
        let conversations: Vec<Conversation> =
            serde_json::from_value(conversations).unwrap();
        assert!(conversations.is_empty());
    }

    #[tokio::test]
    async fn test_send_rejects_empty_recipient() {
        let router = test_router(false).await;
        let (status, _) = post(&router, "/messages/send", JSON, r#"{"to": "  "}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_messages_for_unknown_conversation_is_empty_array() {
        let router = test_router(false).await;
        let (status, json) = get_json(&router, "/conversations/unknown-id/messages").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_conversations_list_newest_first() {
        let router = test_router(false).await;
        for from in ["%2B15551110001", "%2B15551110002"] {
            let payload = format!("From={from}&To=%2B15550009999&Body=hi");
            post(&router, "/webhooks/whatsapp", FORM, &payload).await;
        }

        let (_, conversations) = get_json(&router, "/conversations").await;
        let conversations: Vec<Conversation> =
            serde_json::from_value(conversations).unwrap();
        let participants: Vec<&str> =
            conversations.iter().map(|c| c.participant.as_str()).collect();
        assert_eq!(participants, vec!["+15551110002", "+15551110001"]);
    }
}
