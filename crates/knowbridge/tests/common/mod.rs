//! Test utilities and common setup.
//!
//! Every test gets its own wiremock server standing in for the knowledge
//! service.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use knowbridge::api::{self, AppState};
use knowbridge::config::UpstreamConfig;
use knowbridge::upstream::KnowledgeClient;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CONVERSATION_ID: &str = "65f1a2b3c4d5e6f708192a3b";
pub const MODEL: &str = "mongodb-1";

/// Messages endpoint for the mocked conversation.
pub fn messages_path() -> String {
    format!("/api/v1/conversations/{CONVERSATION_ID}/messages")
}

/// Upstream config pointing at `server`.
pub fn upstream_config(server: &MockServer) -> UpstreamConfig {
    UpstreamConfig {
        base_url: format!("{}/api/v1", server.uri()),
        ..UpstreamConfig::default()
    }
}

pub fn test_client(server: &MockServer) -> Arc<KnowledgeClient> {
    Arc::new(KnowledgeClient::new(&upstream_config(server)).unwrap())
}

/// Answer conversation creation with [`CONVERSATION_ID`].
pub async fn mount_conversation(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": CONVERSATION_ID,
            "created_at": 1_726_000_000_000_i64,
            "messages": []
        })))
        .mount(server)
        .await;
}

/// Answer chat messages with an event stream carrying `events`.
pub async fn mount_stream(server: &MockServer, events: &[Value]) {
    Mock::given(method("POST"))
        .and(path(messages_path()))
        .respond_with(sse_response(events))
        .mount(server)
        .await;
}

pub fn sse_response(events: &[Value]) -> ResponseTemplate {
    let body: String = events.iter().map(|e| format!("data: {e}\n\n")).collect();
    sse_raw(body)
}

pub fn sse_raw(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into().into_bytes(), "text/event-stream")
}

pub fn delta(text: &str) -> Value {
    json!({"type": "delta", "data": text})
}

pub fn finished() -> Value {
    json!({"type": "finished", "data": "6601aa00bb11cc22dd33ee44"})
}

/// Provision a conversation against `server` and build the router.
pub async fn test_app(server: &MockServer) -> Router {
    mount_conversation(server).await;
    let state = AppState::provision(test_client(server), MODEL).await.unwrap();
    api::create_router(state)
}

/// Router over a fixed conversation, without provisioning.
pub fn test_app_without_provisioning(server: &MockServer) -> Router {
    let state = AppState::new(
        test_client(server),
        knowbridge::upstream::ConversationId::new(CONVERSATION_ID),
        MODEL,
    );
    api::create_router(state)
}

/// `data:` payloads of an SSE body, parsed as JSON.
pub fn sse_payloads(body: &[u8]) -> Vec<Value> {
    let text = std::str::from_utf8(body).unwrap();
    text.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim_start()).unwrap())
        .collect()
}
