//! Wire types for knowbridge.
//!
//! Two protocols meet in this crate:
//!
//! ```text
//! Chat client <--[chat.completion.chunk SSE]--> knowbridge <--[typed event SSE]--> Knowledge service
//! ```
//!
//! [`upstream`] describes what the knowledge service sends and expects, and
//! [`openai`] describes the chat-completion shapes exposed to clients. Neither
//! module performs I/O.

pub mod openai;
pub mod upstream;

pub use openai::{
    ChatCompletion, ChatCompletionChunk, ChatCompletionRequest, ChatMessage, ChunkChoice,
    ChunkDelta, FinishReason, MessageContent, ModelCard, ModelList,
};
pub use upstream::{
    ConversationSession, DeltaEvent, FinishedEvent, MessageRequest, Reference,
    ReferenceMetadata, ReferencesEvent,
};
