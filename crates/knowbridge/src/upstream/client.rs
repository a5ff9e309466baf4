//! Knowledge service HTTP client.

use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use knowbridge_protocol::{ConversationSession, MessageRequest};
use reqwest::header::{CONTENT_LENGTH, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use reqwest_eventsource::retry::Never;
use reqwest_eventsource::{Error as SseError, Event as SseEvent, EventSource};
use tracing::{debug, info, instrument};

use super::error::{UpstreamError, UpstreamResult};
use super::events::{RawEvent, UpstreamEvents};
use super::headers::browser_headers;
use crate::config::UpstreamConfig;

/// Identifier of an upstream conversation.
///
/// Created once at startup and shared, read-only, by every request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(Arc<str>);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self(Arc::from(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client for the knowledge service conversation API.
///
/// No request timeouts and no retries: a failed request surfaces immediately
/// and an open stream lasts as long as the transport keeps it alive.
#[derive(Debug, Clone)]
pub struct KnowledgeClient {
    /// HTTP client with the browser profile headers preset.
    client: Client,
    /// API root, e.g. "https://knowledge.mongodb.com/api/v1".
    base_url: String,
}

impl KnowledgeClient {
    /// Create a new client from configuration.
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let client = Client::builder()
            .default_headers(browser_headers(config)?)
            .build()
            .map_err(UpstreamError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: config.api_root().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a conversation and return its identifier.
    ///
    /// Single attempt. Transport failures, non-2xx statuses and bodies that do
    /// not describe a conversation all become [`UpstreamError::SessionCreation`].
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn create_conversation(&self) -> UpstreamResult<ConversationId> {
        let url = format!("{}/conversations", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_LENGTH, "0")
            .header(HeaderName::from_static("sec-gpc"), HeaderValue::from_static("1"))
            .header(HeaderName::from_static("priority"), HeaderValue::from_static("u=4"))
            .send()
            .await
            .map_err(|e| UpstreamError::SessionCreation {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::SessionCreation {
                status: Some(status),
                body: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            return Err(UpstreamError::SessionCreation {
                status: Some(status),
                body,
            });
        }

        let session: ConversationSession =
            serde_json::from_str(&body).map_err(|e| UpstreamError::SessionCreation {
                status: Some(status),
                body: format!("unexpected conversation body ({e}): {body}"),
            })?;

        info!(conversation_id = %session.id, "Created upstream conversation");
        Ok(ConversationId::new(session.id))
    }

    /// Send `text` to the conversation and open its answer stream.
    ///
    /// Returns once the service has accepted the request. A rejected request
    /// has its body read in full and returned in [`UpstreamError::Request`].
    #[instrument(skip(self, conversation, text), fields(conversation_id = %conversation))]
    pub async fn send_message(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> UpstreamResult<UpstreamEvents> {
        let url = format!(
            "{}/conversations/{}/messages?stream=true",
            self.base_url, conversation
        );
        let request = self
            .client
            .post(&url)
            .header(HeaderName::from_static("priority"), HeaderValue::from_static("u=0"))
            .json(&MessageRequest::new(text));

        let mut source =
            EventSource::new(request).map_err(|e| UpstreamError::ConnectionFailed {
                url: url.clone(),
                message: e.to_string(),
            })?;
        source.set_retry_policy(Box::new(Never));

        match source.next().await {
            Some(Ok(SseEvent::Open)) => {
                debug!("upstream event stream opened");
                Ok(UpstreamEvents::new(source, None))
            }
            Some(Ok(SseEvent::Message(message))) => Ok(UpstreamEvents::new(
                source,
                Some(RawEvent {
                    event: message.event,
                    data: message.data,
                }),
            )),
            Some(Err(SseError::InvalidStatusCode(status, response))) => {
                source.close();
                Err(UpstreamError::Request {
                    status,
                    body: read_body(response).await,
                })
            }
            Some(Err(SseError::InvalidContentType(_, response))) => {
                source.close();
                let status = response.status();
                Err(UpstreamError::Request {
                    status,
                    body: read_body(response).await,
                })
            }
            Some(Err(SseError::Transport(e))) => {
                source.close();
                Err(UpstreamError::ConnectionFailed {
                    url,
                    message: e.to_string(),
                })
            }
            Some(Err(e)) => {
                source.close();
                Err(UpstreamError::StreamRead(e.to_string()))
            }
            None => Err(UpstreamError::StreamRead(
                "stream closed before it was opened".to_string(),
            )),
        }
    }
}

async fn read_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable response body: {e}>"))
}
