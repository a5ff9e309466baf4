//! Knowledge service client module.
//!
//! Provisions the process-wide conversation and opens one event stream per
//! chat message.

mod client;
mod error;
mod events;
mod headers;

pub use client::{ConversationId, KnowledgeClient};
pub use error::{UpstreamError, UpstreamResult};
pub use events::{RawEvent, RawEventStream, UpstreamEvents};
pub use headers::browser_headers;
