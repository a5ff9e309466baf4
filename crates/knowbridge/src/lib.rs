//! Knowbridge Library
//!
//! Bridges the MongoDB knowledge chatbot to clients that speak the
//! chat-completion streaming protocol. A request flows through:
//!
//! ```text
//! api (gateway) -> upstream (session + event stream) -> dispatch (classify) -> sink (re-frame)
//! ```

pub mod api;
pub mod config;
pub mod dispatch;
pub mod sink;
pub mod upstream;
