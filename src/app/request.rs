//! Outbound requests started by handlers

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::events::RequestOutcome;
use crate::agent::AgentClient;
use crate::chat::SessionId;
use crate::relay::ContentRelay;

/// Identifier of an in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Ask the agent about user text
    Agent { input_text: String },
    /// Ask the relay for a file's content
    FileContent { file_name: String },
}

/// A request tagged with the session its reply belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub id: RequestId,
    pub session_id: SessionId,
    pub kind: RequestKind,
}

impl OutboundRequest {
    /// Perform the request. Touches no store; the outcome is applied later
    /// by the owner of the stores.
    pub async fn execute(
        &self,
        agent: Arc<dyn AgentClient>,
        relay: Arc<dyn ContentRelay>,
    ) -> RequestOutcome {
        debug!("Executing request {} for session {}", self.id, self.session_id);
        match &self.kind {
            RequestKind::Agent { input_text } => {
                RequestOutcome::AgentReply(agent.ask(input_text).await)
            }
            RequestKind::FileContent { file_name } => {
                RequestOutcome::FileContent(relay.fetch_content(file_name).await)
            }
        }
    }
}
