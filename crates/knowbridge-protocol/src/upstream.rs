//! Knowledge service types.
//!
//! The service streams JSON objects discriminated by a `type` field. Only three
//! discriminants carry meaning for the bridge; anything else is ignored by the
//! dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminant of an incremental answer fragment.
pub const DELTA: &str = "delta";

/// Discriminant of the citation list.
pub const REFERENCES: &str = "references";

/// Discriminant of the terminal marker.
pub const FINISHED: &str = "finished";

// ============================================================================
// Conversations
// ============================================================================

/// Body returned by `POST /conversations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    #[serde(rename = "_id")]
    pub id: String,
    pub created_at: i64,
    #[serde(default)]
    pub messages: Vec<Value>,
}

/// Body sent to `POST /conversations/{id}/messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

impl MessageRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Stream events
// ============================================================================

/// `{"type":"delta","data":"..."}`: one fragment of the answer text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: String,
}

impl DeltaEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            kind: DELTA.to_string(),
            data: data.into(),
        }
    }
}

/// `{"type":"references","data":[...]}`: citations backing the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencesEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Vec<Reference>,
}

impl ReferencesEvent {
    pub fn new(data: Vec<Reference>) -> Self {
        Self {
            kind: REFERENCES.to_string(),
            data,
        }
    }
}

/// A single citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub metadata: ReferenceMetadata,
}

impl Reference {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            metadata: ReferenceMetadata::default(),
        }
    }

    /// Markdown link form, `[title](url)`.
    pub fn to_markdown(&self) -> String {
        format!("[{}]({})", self.title, self.url)
    }
}

/// Provenance details attached to a citation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReferenceMetadata {
    pub source_name: Option<String>,
    pub tags: Vec<String>,
    pub source_type: Option<String>,
}

/// `{"type":"finished","data":...}`: end of the answer. The payload is opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl Default for FinishedEvent {
    fn default() -> Self {
        Self {
            kind: FINISHED.to_string(),
            data: None,
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Header placed in front of the rendered reference list.
pub const REFERENCES_HEADER: &str = "\n## References\n- ";

/// Render references as markdown links, one per bullet.
///
/// The first bullet marker is supplied by [`REFERENCES_HEADER`], so the
/// result starts directly with the first link.
pub fn render_references(references: &[Reference]) -> String {
    references
        .iter()
        .map(Reference::to_markdown)
        .collect::<Vec<_>>()
        .join("\n- ")
}

/// [`REFERENCES_HEADER`] followed by [`render_references`].
pub fn references_block(references: &[Reference]) -> String {
    let mut block = String::from(REFERENCES_HEADER);
    block.push_str(&render_references(references));
    block
}
