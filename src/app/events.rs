//! Application events for the event-driven architecture

use std::path::PathBuf;

use crate::agent::AgentError;
use crate::chat::{Attachment, SessionId};
use crate::relay::RelayError;

use super::RequestId;

/// Result of a background request
#[derive(Debug)]
pub enum RequestOutcome {
    /// Decoded agent reply
    AgentReply(Result<String, AgentError>),
    /// Extracted file content
    FileContent(Result<String, RelayError>),
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            RequestOutcome::AgentReply(result) => result.is_ok(),
            RequestOutcome::FileContent(result) => result.is_ok(),
        }
    }
}

/// Events delivered to the UI loop from background tasks
#[derive(Debug)]
pub enum AppEvent {
    /// A request finished; its outcome must be applied to the stores
    RequestCompleted {
        request_id: RequestId,
        session_id: SessionId,
        outcome: RequestOutcome,
    },

    /// A file was read from disk and is ready to upload
    AttachmentLoaded {
        path: PathBuf,
        result: std::io::Result<Attachment>,
    },
}

impl AppEvent {
    /// Get the session ID associated with this event, if any
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            AppEvent::RequestCompleted { session_id, .. } => Some(*session_id),
            AppEvent::AttachmentLoaded { .. } => None,
        }
    }
}
