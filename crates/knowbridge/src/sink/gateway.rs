//! Chat-completion chunk sink for the HTTP gateway.

use async_trait::async_trait;
use knowbridge_protocol::upstream::references_block;
use knowbridge_protocol::{ChatCompletionChunk, DeltaEvent, FinishedEvent, ReferencesEvent};
use tokio::sync::mpsc;

use super::{EventSink, SinkError};

/// Re-frames events as `chat.completion.chunk` payloads.
///
/// Each callback serializes one chunk and hands it to the response body
/// through a bounded channel, waiting for capacity. The receiving side turns
/// every payload into one SSE `data:` frame.
#[derive(Debug)]
pub struct GatewaySink {
    tx: mpsc::Sender<String>,
    model: String,
}

impl GatewaySink {
    pub fn new(tx: mpsc::Sender<String>, model: impl Into<String>) -> Self {
        Self {
            tx,
            model: model.into(),
        }
    }

    /// Create a sink together with the receiver feeding the response body.
    pub fn channel(model: impl Into<String>, buffer: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx, model), rx)
    }

    async fn emit(&mut self, chunk: ChatCompletionChunk) -> Result<(), SinkError> {
        let payload = serde_json::to_string(&chunk)?;
        self.tx.send(payload).await.map_err(|_| SinkError::Closed)
    }
}

#[async_trait]
impl EventSink for GatewaySink {
    async fn on_delta(&mut self, event: DeltaEvent) -> Result<(), SinkError> {
        let chunk = ChatCompletionChunk::content(self.model.clone(), event.data);
        self.emit(chunk).await
    }

    async fn on_references(&mut self, event: ReferencesEvent) -> Result<(), SinkError> {
        let chunk = ChatCompletionChunk::content(self.model.clone(), references_block(&event.data));
        self.emit(chunk).await
    }

    async fn on_finished(&mut self, _event: FinishedEvent) -> Result<(), SinkError> {
        let chunk = ChatCompletionChunk::finished(self.model.clone());
        self.emit(chunk).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowbridge_protocol::{FinishReason, Reference};

    fn parse(payload: &str) -> ChatCompletionChunk {
        serde_json::from_str(payload).unwrap()
    }

    #[tokio::test]
    async fn test_delta_becomes_content_chunk() {
        let (mut sink, mut rx) = GatewaySink::channel("mongodb-1", 4);
        sink.on_delta(DeltaEvent::new("Hello ")).await.unwrap();

        let chunk = parse(&rx.recv().await.unwrap());
        assert_eq!(chunk.object, "chat.completion.chunk");
        assert_eq!(chunk.model, "mongodb-1");
        assert_eq!(chunk.content_text(), Some("Hello "));
        assert_eq!(chunk.finish_reason(), None);
    }

    #[tokio::test]
    async fn test_quotes_and_newlines_round_trip() {
        let (mut sink, mut rx) = GatewaySink::channel("m", 4);
        let fragment = "use \"$set\":\n  { a: 1 }\r\n\\done";
        sink.on_delta(DeltaEvent::new(fragment)).await.unwrap();

        let payload = rx.recv().await.unwrap();
        assert!(!payload.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["choices"][0]["delta"]["content"], fragment);
    }

    #[tokio::test]
    async fn test_references_use_escaped_newlines() {
        let (mut sink, mut rx) = GatewaySink::channel("m", 4);
        sink.on_references(ReferencesEvent::new(vec![
            Reference::new("A", "http://a"),
            Reference::new("B", "http://b"),
        ]))
        .await
        .unwrap();

        let payload = rx.recv().await.unwrap();
        assert!(payload.contains(r#"\n## References\n- [A](http://a)\n- [B](http://b)"#));
        let chunk = parse(&payload);
        assert_eq!(
            chunk.content_text(),
            Some("\n## References\n- [A](http://a)\n- [B](http://b)")
        );
    }

    #[tokio::test]
    async fn test_finished_is_terminal_chunk() {
        let (mut sink, mut rx) = GatewaySink::channel("m", 4);
        sink.on_finished(FinishedEvent::default()).await.unwrap();

        let payload = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["choices"][0]["delta"], serde_json::json!({}));
        assert_eq!(parse(&payload).finish_reason(), Some(FinishReason::Stop));
    }

    #[tokio::test]
    async fn test_closed_receiver_reports_closed() {
        let (mut sink, rx) = GatewaySink::channel("m", 1);
        drop(rx);
        let err = sink.on_delta(DeltaEvent::new("late")).await.unwrap_err();
        assert!(matches!(err, SinkError::Closed));
    }

    #[tokio::test]
    async fn test_single_slot_waits_for_reader() {
        let (mut sink, mut rx) = GatewaySink::channel("m", 1);
        sink.on_delta(DeltaEvent::new("first")).await.unwrap();

        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            sink.on_delta(DeltaEvent::new("second")),
        )
        .await;
        assert!(blocked.is_err());

        assert_eq!(parse(&rx.recv().await.unwrap()).content_text(), Some("first"));
        sink.on_delta(DeltaEvent::new("second")).await.unwrap();
        assert_eq!(parse(&rx.recv().await.unwrap()).content_text(), Some("second"));
    }
}
