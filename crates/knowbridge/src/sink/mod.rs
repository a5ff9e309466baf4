//! Output channels for typed upstream events.
//!
//! Every sink implements the same three callbacks. Each callback emits exactly
//! one unit of output and makes it visible to the reader before returning.

mod collector;
mod console;
mod gateway;

use async_trait::async_trait;
use knowbridge_protocol::{DeltaEvent, FinishedEvent, ReferencesEvent};
use thiserror::Error;

pub use collector::CompletionCollector;
pub use console::ConsoleSink;
pub use gateway::GatewaySink;

/// Errors raised while emitting output.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The reader went away (client disconnected).
    #[error("output closed by reader")]
    Closed,

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode chunk: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Capability set invoked by the dispatcher, one method per event type.
#[async_trait]
pub trait EventSink: Send {
    async fn on_delta(&mut self, event: DeltaEvent) -> Result<(), SinkError>;

    async fn on_references(&mut self, event: ReferencesEvent) -> Result<(), SinkError>;

    async fn on_finished(&mut self, event: FinishedEvent) -> Result<(), SinkError>;
}
