//! Knowledge service error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for knowledge service operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Errors that can occur while talking to the knowledge service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// A configured header value is not a valid HTTP header.
    #[error("invalid value for header {name}: {message}")]
    InvalidHeader { name: &'static str, message: String },

    /// Conversation provisioning failed. `status` is `None` when no response
    /// was received.
    #[error("error creating conversation session ({}): {body}", display_status(.status))]
    SessionCreation {
        status: Option<StatusCode>,
        body: String,
    },

    /// A chat request was answered with something other than an event stream.
    #[error("upstream request failed with status {status}: {body}")]
    Request { status: StatusCode, body: String },

    /// The chat request never reached the service.
    #[error("failed to connect to upstream at {url}: {message}")]
    ConnectionFailed { url: String, message: String },

    /// The event stream broke after it was opened.
    #[error("error reading stream: {0}")]
    StreamRead(String),
}

impl UpstreamError {
    /// Upstream status code, when the service answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::SessionCreation { status, .. } => *status,
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn display_status(status: &Option<StatusCode>) -> String {
    match status {
        Some(status) => format!("status {status}"),
        None => "no response".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation_message_with_status() {
        let err = UpstreamError::SessionCreation {
            status: Some(StatusCode::FORBIDDEN),
            body: "blocked".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "error creating conversation session (status 403 Forbidden): blocked"
        );
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_session_creation_message_without_status() {
        let err = UpstreamError::SessionCreation {
            status: None,
            body: "dns failure".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "error creating conversation session (no response): dns failure"
        );
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_request_error_keeps_body_verbatim() {
        let body = r#"{"error":"Too many messages"}"#;
        let err = UpstreamError::Request {
            status: StatusCode::BAD_REQUEST,
            body: body.to_string(),
        };
        assert!(err.to_string().ends_with(body));
    }
}
