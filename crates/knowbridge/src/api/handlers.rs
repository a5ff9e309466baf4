//! API request handlers.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::Uri,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
};
use knowbridge_protocol::{ChatCompletionRequest, ModelList};
use serde::Serialize;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tracing::{Instrument, debug, info, instrument, warn};

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::dispatch::{RelayOutcome, relay};
use crate::sink::{CompletionCollector, GatewaySink};

/// Chunks in flight between the relay task and the response body. With one
/// slot the relay cannot get more than one chunk ahead of the client.
const CHUNK_BUFFER: usize = 1;

/// Owner reported for the served model.
const MODEL_OWNER: &str = "mongodb";

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
}

pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "knowbridge: MongoDB knowledge chatbot as a chat-completion API. POST /v1/chat/completions".to_string(),
    })
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(ModelList::single(state.model.clone(), MODEL_OWNER))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("no route for {}", uri.path()))
}

/// Forward the first message to the knowledge service and relay its answer.
///
/// The upstream request is made before any response bytes are written, so a
/// rejected request still gets a proper error status.
#[instrument(skip(state, payload), fields(conversation_id = %state.conversation))]
pub async fn chat_completions(
    State(state): State<AppState>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    let first = request
        .messages
        .first()
        .ok_or_else(|| ApiError::bad_request("messages must not be empty"))?;
    let text = first.content.to_text();

    debug!(stream = request.stream, chars = text.len(), "Forwarding chat message");
    let mut events = state.client.send_message(&state.conversation, &text).await?;

    if !request.stream {
        let mut collector = CompletionCollector::new(state.model.clone());
        let report = relay(&mut events, &mut collector).await;
        if let RelayOutcome::StreamFailed(err) = report.outcome {
            if collector.content().is_empty() {
                return Err(err.into());
            }
            warn!(error = %err, "Returning partial answer after stream failure");
        }
        return Ok(Json(collector.into_completion()).into_response());
    }

    let (mut sink, rx) = GatewaySink::channel(state.model.clone(), CHUNK_BUFFER);
    tokio::spawn(
        async move {
            let report = relay(&mut events, &mut sink).await;
            match report.outcome {
                RelayOutcome::Completed => info!(
                    delivered = report.delivered,
                    dropped = report.dropped,
                    decode_failures = report.decode_failures,
                    finished = report.finished,
                    "Chat stream complete"
                ),
                RelayOutcome::StreamFailed(err) => {
                    warn!(error = %err, delivered = report.delivered, "Chat stream ended early")
                }
                RelayOutcome::SinkClosed(err) => {
                    info!(reason = %err, delivered = report.delivered, "Client went away")
                }
            }
        }
        .in_current_span(),
    );

    let stream = ReceiverStream::new(rx)
        .map(|payload| Ok::<Event, Infallible>(Event::default().data(payload)));

    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response())
}
