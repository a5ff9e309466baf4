//! Lazy event sequence over an open chat stream.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Error as SseError, Event as SseEvent, EventSource};
use tracing::debug;

use super::error::{UpstreamError, UpstreamResult};

/// One undecoded event from the knowledge service.
///
/// `data` is expected to be a JSON object with a `type` field, but nothing is
/// checked until dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// SSE event name (`message` unless the service sets one).
    pub event: String,
    pub data: String,
}

impl RawEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event: "message".to_string(),
            data: data.into(),
        }
    }
}

/// A finite, pull-based, non-restartable sequence of raw events.
#[async_trait]
pub trait RawEventStream: Send {
    /// Pull the next event.
    ///
    /// `None` is normal end of stream. After an error the sequence is
    /// exhausted and every further pull returns `None`.
    async fn next_event(&mut self) -> Option<UpstreamResult<RawEvent>>;

    /// Abandon the sequence and release the connection.
    fn close(&mut self);
}

/// Events of one chat response, read through `reqwest-eventsource`.
///
/// Built by [`KnowledgeClient::send_message`](super::KnowledgeClient::send_message)
/// once the connection is open.
pub struct UpstreamEvents {
    source: EventSource,
    /// Message that arrived while waiting for the open signal.
    pending: Option<RawEvent>,
    closed: bool,
}

impl UpstreamEvents {
    pub(crate) fn new(source: EventSource, pending: Option<RawEvent>) -> Self {
        Self {
            source,
            pending,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl RawEventStream for UpstreamEvents {
    async fn next_event(&mut self) -> Option<UpstreamResult<RawEvent>> {
        if let Some(event) = self.pending.take() {
            return Some(Ok(event));
        }
        if self.closed {
            return None;
        }

        loop {
            match self.source.next().await {
                Some(Ok(SseEvent::Open)) => continue,
                Some(Ok(SseEvent::Message(message))) => {
                    return Some(Ok(RawEvent {
                        event: message.event,
                        data: message.data,
                    }));
                }
                Some(Err(SseError::StreamEnded)) | None => {
                    debug!("upstream event stream ended");
                    self.close();
                    return None;
                }
                Some(Err(err)) => {
                    self.close();
                    return Some(Err(UpstreamError::StreamRead(err.to_string())));
                }
            }
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.source.close();
            self.closed = true;
        }
    }
}

impl Drop for UpstreamEvents {
    fn drop(&mut self) {
        self.close();
    }
}
