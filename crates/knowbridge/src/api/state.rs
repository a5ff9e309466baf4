//! Application state shared across handlers.

use std::sync::Arc;

use tracing::info;

use crate::upstream::{ConversationId, KnowledgeClient, UpstreamResult};

/// Everything a request needs: the upstream client, the conversation created
/// at startup, and the model name reported to clients.
#[derive(Clone, Debug)]
pub struct AppState {
    pub client: Arc<KnowledgeClient>,
    pub conversation: ConversationId,
    pub model: String,
}

impl AppState {
    pub fn new(
        client: Arc<KnowledgeClient>,
        conversation: ConversationId,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            conversation,
            model: model.into(),
        }
    }

    /// Create the conversation on the knowledge service and build the state
    /// around it. Must succeed before the gateway starts serving.
    pub async fn provision(
        client: Arc<KnowledgeClient>,
        model: impl Into<String>,
    ) -> UpstreamResult<Self> {
        let conversation = client.create_conversation().await?;
        let state = Self::new(client, conversation, model);
        info!(
            conversation_id = %state.conversation,
            model = %state.model,
            "Gateway state ready"
        );
        Ok(state)
    }
}
