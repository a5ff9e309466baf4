//! Chat-completion protocol types.
//!
//! Only the subset needed to accept a chat request and answer it, either as a
//! stream of `chat.completion.chunk` objects or as a single `chat.completion`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `object` value of a streamed chunk.
pub const CHUNK_OBJECT: &str = "chat.completion.chunk";

/// `object` value of a non-streamed completion.
pub const COMPLETION_OBJECT: &str = "chat.completion";

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /v1/chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_stream")]
    pub stream: bool,
}

fn default_stream() -> bool {
    true
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

/// Message content: either a plain string or a list of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Flatten to plain text. Non-text parts are skipped and text parts are
    /// joined with newlines.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A typed content part. Only `text` parts contribute to the forwarded message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// ============================================================================
// Streamed responses
// ============================================================================

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
}

/// One `chat.completion.chunk` event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    /// Serialized as `null` until the terminal chunk.
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// A chunk carrying a piece of assistant text.
    pub fn content(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_choice(
            model,
            ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: Some(text.into()),
                },
                finish_reason: None,
            },
        )
    }

    /// The terminal chunk: empty delta, `finish_reason: "stop"`.
    pub fn finished(model: impl Into<String>) -> Self {
        Self::with_choice(
            model,
            ChunkChoice {
                index: 0,
                delta: ChunkDelta::default(),
                finish_reason: Some(FinishReason::Stop),
            },
        )
    }

    fn with_choice(model: impl Into<String>, choice: ChunkChoice) -> Self {
        Self {
            id: completion_id(),
            object: CHUNK_OBJECT.to_string(),
            created: Utc::now().timestamp(),
            model: model.into(),
            choices: vec![choice],
        }
    }

    /// Text carried by the first choice, if any.
    pub fn content_text(&self) -> Option<&str> {
        self.choices.first()?.delta.content.as_deref()
    }

    /// Finish reason of the first choice, if any.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.choices.first()?.finish_reason
    }
}

/// Fresh `chatcmpl-<uuid>` identifier.
pub fn completion_id() -> String {
    format!("chatcmpl-{}", Uuid::new_v4())
}

// ============================================================================
// Non-streamed responses
// ============================================================================

/// A complete `chat.completion` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

impl ChatCompletion {
    pub fn new(
        model: impl Into<String>,
        content: impl Into<String>,
        finish_reason: Option<FinishReason>,
    ) -> Self {
        Self {
            id: completion_id(),
            object: COMPLETION_OBJECT.to_string(),
            created: Utc::now().timestamp(),
            model: model.into(),
            choices: vec![CompletionChoice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant".to_string(),
                    content: content.into(),
                },
                finish_reason,
            }],
        }
    }
}

// ============================================================================
// Models
// ============================================================================

/// Response of `GET /v1/models`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCard {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

impl ModelList {
    /// A list advertising a single model.
    pub fn single(id: impl Into<String>, owned_by: impl Into<String>) -> Self {
        Self {
            object: "list".to_string(),
            data: vec![ModelCard {
                id: id.into(),
                object: "model".to_string(),
                created: 0,
                owned_by: owned_by.into(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_content_chunk_wire_shape() {
        let chunk = ChatCompletionChunk::content("mongodb-1", "Hello ");
        let json: Value = serde_json::to_value(&chunk).unwrap();

        assert!(json["id"].as_str().unwrap().starts_with("chatcmpl-"));
        assert_eq!(json["object"], "chat.completion.chunk");
        assert!(json["created"].is_i64());
        assert_eq!(json["model"], "mongodb-1");
        assert_eq!(json["choices"][0]["index"], 0);
        assert_eq!(json["choices"][0]["delta"], json!({"content": "Hello "}));
        assert!(json["choices"][0]["finish_reason"].is_null());
    }

    #[test]
    fn test_finished_chunk_wire_shape() {
        let chunk = ChatCompletionChunk::finished("mongodb-1");
        let json: Value = serde_json::to_value(&chunk).unwrap();

        assert_eq!(json["choices"][0]["delta"], json!({}));
        assert_eq!(json["choices"][0]["finish_reason"], "stop");
        assert_eq!(chunk.finish_reason(), Some(FinishReason::Stop));
        assert_eq!(chunk.content_text(), None);
    }

    #[test]
    fn test_chunk_ids_are_distinct() {
        let a = ChatCompletionChunk::content("m", "x");
        let b = ChatCompletionChunk::content("m", "x");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_escaping_survives_round_trip() {
        let fragment = "say \"hi\"\n\tthen \\ leave \u{1}";
        let wire = serde_json::to_string(&ChatCompletionChunk::content("m", fragment)).unwrap();

        assert!(wire.contains(r#"say \"hi\"\n\tthen \\ leave \u0001"#));
        let parsed: ChatCompletionChunk = serde_json::from_str(&wire).unwrap();
        assert_eq!(parsed.content_text(), Some(fragment));
    }

    #[test]
    fn test_request_defaults_to_streaming() {
        let request: ChatCompletionRequest = serde_json::from_value(json!({
            "model": "gpt-4",
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();
        assert!(request.stream);
        assert_eq!(request.messages[0].content.to_text(), "hi");
    }

    #[test]
    fn test_request_accepts_content_parts() {
        let request: ChatCompletionRequest = serde_json::from_value(json!({
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "first"},
                    {"type": "image_url", "image_url": {"url": "http://img"}},
                    {"type": "text", "text": "second"}
                ]
            }],
            "stream": false
        }))
        .unwrap();
        assert!(!request.stream);
        assert_eq!(request.model, "");
        assert_eq!(request.messages[0].content.to_text(), "first\nsecond");
    }

    #[test]
    fn test_completion_shape() {
        let completion = ChatCompletion::new("mongodb-1", "answer", Some(FinishReason::Stop));
        let json: Value = serde_json::to_value(&completion).unwrap();
        assert_eq!(json["object"], "chat.completion");
        assert_eq!(json["choices"][0]["message"]["role"], "assistant");
        assert_eq!(json["choices"][0]["message"]["content"], "answer");
        assert_eq!(json["choices"][0]["finish_reason"], "stop");
    }

    #[test]
    fn test_model_list_single() {
        let list = ModelList::single("mongodb-1", "knowbridge");
        let json: Value = serde_json::to_value(&list).unwrap();
        assert_eq!(json["object"], "list");
        assert_eq!(json["data"][0]["id"], "mongodb-1");
        assert_eq!(json["data"][0]["object"], "model");
    }
}
