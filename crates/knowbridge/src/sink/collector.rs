//! Buffering sink for non-streaming chat requests.

use async_trait::async_trait;
use knowbridge_protocol::upstream::references_block;
use knowbridge_protocol::{ChatCompletion, DeltaEvent, FinishReason, FinishedEvent, ReferencesEvent};

use super::{EventSink, SinkError};

/// Accumulates the answer and produces one `chat.completion` at the end.
#[derive(Debug)]
pub struct CompletionCollector {
    model: String,
    content: String,
    finish_reason: Option<FinishReason>,
}

impl CompletionCollector {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            content: String::new(),
            finish_reason: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_completion(self) -> ChatCompletion {
        ChatCompletion::new(self.model, self.content, self.finish_reason)
    }
}

#[async_trait]
impl EventSink for CompletionCollector {
    async fn on_delta(&mut self, event: DeltaEvent) -> Result<(), SinkError> {
        self.content.push_str(&event.data);
        Ok(())
    }

    async fn on_references(&mut self, event: ReferencesEvent) -> Result<(), SinkError> {
        self.content.push_str(&references_block(&event.data));
        Ok(())
    }

    async fn on_finished(&mut self, _event: FinishedEvent) -> Result<(), SinkError> {
        self.finish_reason = Some(FinishReason::Stop);
        Ok(())
    }
}
