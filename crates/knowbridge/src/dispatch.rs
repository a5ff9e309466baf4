//! Event classification and the per-request relay loop.
//!
//! Each raw event is decoded twice: once into a loose JSON map to read the
//! `type` discriminant, then strictly into the typed payload for that
//! discriminant. Events with an unknown or missing `type` are dropped without
//! error. The dispatcher keeps no state between events.

use knowbridge_protocol::upstream::{DELTA, FINISHED, REFERENCES};
use knowbridge_protocol::{DeltaEvent, FinishedEvent, ReferencesEvent};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::sink::{EventSink, SinkError};
use crate::upstream::{RawEvent, RawEventStream, UpstreamError};

/// Errors from dispatching a single event.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The payload is not JSON, not an object, or does not match the shape
    /// of its `type`. The event is lost.
    #[error("failed to decode upstream event: {0}")]
    Decode(#[from] serde_json::Error),

    /// The sink could not emit the event.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// What [`dispatch`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Delta,
    References,
    Finished,
    /// Unrecognized discriminant, nothing was emitted.
    Dropped,
}

/// Classify `raw` by its `type` field and invoke the matching sink callback.
pub async fn dispatch(
    raw: &RawEvent,
    sink: &mut dyn EventSink,
) -> Result<Dispatched, DispatchError> {
    let envelope: Map<String, Value> = serde_json::from_str(&raw.data)?;
    let kind = envelope.get("type").and_then(Value::as_str);

    match kind {
        Some(DELTA) => {
            let event: DeltaEvent = decode(raw)?;
            sink.on_delta(event).await?;
            Ok(Dispatched::Delta)
        }
        Some(REFERENCES) => {
            let event: ReferencesEvent = decode(raw)?;
            sink.on_references(event).await?;
            Ok(Dispatched::References)
        }
        Some(FINISHED) => {
            let event: FinishedEvent = decode(raw)?;
            sink.on_finished(event).await?;
            Ok(Dispatched::Finished)
        }
        other => {
            debug!(event_type = ?other, "Dropping unrecognized upstream event");
            Ok(Dispatched::Dropped)
        }
    }
}

fn decode<T: DeserializeOwned>(raw: &RawEvent) -> Result<T, serde_json::Error> {
    serde_json::from_str(&raw.data)
}

/// How a relay loop ended.
#[derive(Debug)]
pub enum RelayOutcome {
    /// Upstream reached end of stream.
    Completed,
    /// Upstream failed mid-stream; the stream is treated as ended.
    StreamFailed(UpstreamError),
    /// The sink stopped accepting output; upstream was abandoned and closed.
    SinkClosed(SinkError),
}

/// Summary of one relay loop.
#[derive(Debug)]
pub struct RelayReport {
    /// Events handed to the sink.
    pub delivered: usize,
    /// Events with an unrecognized discriminant.
    pub dropped: usize,
    /// Events lost to decode errors.
    pub decode_failures: usize,
    /// Whether a `finished` event was delivered.
    pub finished: bool,
    pub outcome: RelayOutcome,
}

impl RelayReport {
    fn new() -> Self {
        Self {
            delivered: 0,
            dropped: 0,
            decode_failures: 0,
            finished: false,
            outcome: RelayOutcome::Completed,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, RelayOutcome::Completed)
    }
}

/// Drain `events` into `sink`, strictly in order.
///
/// A malformed event is logged and skipped. A stream error ends the loop. A
/// sink error also ends the loop and closes the upstream stream.
pub async fn relay(events: &mut dyn RawEventStream, sink: &mut dyn EventSink) -> RelayReport {
    let mut report = RelayReport::new();

    while let Some(next) = events.next_event().await {
        let raw = match next {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "Upstream stream failed");
                report.outcome = RelayOutcome::StreamFailed(err);
                return report;
            }
        };

        match dispatch(&raw, sink).await {
            Ok(Dispatched::Dropped) => report.dropped += 1,
            Ok(kind) => {
                report.delivered += 1;
                if kind == Dispatched::Finished {
                    report.finished = true;
                }
            }
            Err(DispatchError::Decode(err)) => {
                report.decode_failures += 1;
                warn!(error = %err, payload = %raw.data, "Skipping malformed upstream event");
            }
            Err(DispatchError::Sink(err)) => {
                debug!(error = %err, "Sink closed, abandoning upstream stream");
                events.close();
                report.outcome = RelayOutcome::SinkClosed(err);
                return report;
            }
        }
    }

    report
}
