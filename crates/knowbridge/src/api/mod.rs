//! HTTP API module.
//!
//! Exposes the knowledge service as an OpenAI-style chat-completion endpoint.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::{HealthResponse, WelcomeResponse};
pub use routes::create_router;
pub use state::AppState;
