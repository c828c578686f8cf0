//! Conversational agent client
//!
//! The agent answers each prompt with a stream of binary chunks. The HTTP
//! client produces chunk streams and the decoder reassembles a stream into
//! the reply text.

pub mod chunk;
pub mod client;
pub mod decoder;
pub mod errors;

pub use client::{AgentClient, AgentContext, HttpAgentClient};
pub use errors::AgentError;
