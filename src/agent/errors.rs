//! Error types for the agent client

use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Agent returned status {status}: {body}")]
    StatusError { status: u16, body: String },

    #[error("Decode error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Failures while turning the chunk stream into text
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unexpected chunk format: {0}")]
    MalformedChunk(String),

    #[error("Response is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
}

pub type AgentResult<T> = Result<T, AgentError>;
