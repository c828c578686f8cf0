//! In-memory chat state
//!
//! This module holds the session list and the message history. Both stores
//! are owned by the UI loop and mutated synchronously from its handlers.

mod message;
mod session;

pub use message::*;
pub use session::*;

use thiserror::Error;

/// Outcome of a text prompt shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    /// The user submitted this text (possibly empty)
    Submitted(String),
    /// The user dismissed the prompt
    Cancelled,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),
}
