//! Chunk model and wire framing for streamed agent responses
//!
//! The response body is newline-delimited JSON. Each frame is either
//! `{"bytes": "<base64>"}` or `{"payload": "<base64>"}`; anything else is
//! rejected when the frame is classified.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::{stream, Stream};
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;

use super::errors::{AgentError, DecodeError};

/// One unit of a streamed agent response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentChunk {
    /// A raw byte buffer
    Bytes(Vec<u8>),
    /// A record wrapping its bytes in a `payload` field
    Payload { payload: Vec<u8> },
}

impl AgentChunk {
    /// Bytes carried by this chunk
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AgentChunk::Bytes(bytes) => bytes,
            AgentChunk::Payload { payload } => payload,
        }
    }

    /// Classify a decoded JSON frame
    pub fn from_frame(frame: &Value) -> Result<Self, DecodeError> {
        if let Some(encoded) = frame.get("bytes").and_then(Value::as_str) {
            return Ok(AgentChunk::Bytes(decode_base64(encoded)?));
        }

        if let Some(encoded) = frame.get("payload").and_then(Value::as_str) {
            return Ok(AgentChunk::Payload {
                payload: decode_base64(encoded)?,
            });
        }

        Err(DecodeError::MalformedChunk(summarize(frame)))
    }

    /// Parse and classify one line of the response body
    pub fn from_line(line: &[u8]) -> Result<Self, DecodeError> {
        let frame: Value = serde_json::from_slice(line)
            .map_err(|e| DecodeError::MalformedChunk(format!("invalid JSON frame: {}", e)))?;
        Self::from_frame(&frame)
    }
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| DecodeError::MalformedChunk(format!("invalid base64: {}", e)))
}

fn summarize(frame: &Value) -> String {
    match frame {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
        Value::Array(_) => "array".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Null => "null".to_string(),
    }
}

/// Splits a byte stream into newline-terminated frames
#[derive(Debug, Default)]
pub struct FrameSplitter {
    pending: Vec<u8>,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every frame completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if !line.iter().all(u8::is_ascii_whitespace) {
                frames.push(line);
            }
        }
        frames
    }

    /// Return the trailing frame left without a newline, if any
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.pending);
        if rest.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(rest)
        }
    }
}

/// Stream of classified chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<AgentChunk, AgentError>> + Send>>;

struct FrameState<S> {
    body: Pin<Box<S>>,
    splitter: FrameSplitter,
    ready: VecDeque<Vec<u8>>,
    done: bool,
}

/// Turn a raw body stream into a stream of classified chunks
pub fn chunk_stream<S, B, E>(body: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<AgentError> + Send + 'static,
{
    use futures::StreamExt;

    let state = FrameState {
        body: Box::pin(body),
        splitter: FrameSplitter::new(),
        ready: VecDeque::new(),
        done: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.ready.pop_front() {
                let item = AgentChunk::from_line(&line).map_err(AgentError::from);
                return Some((item, state));
            }

            if state.done {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let frames = state.splitter.push(bytes.as_ref());
                    state.ready.extend(frames);
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    state.done = true;
                    if let Some(rest) = state.splitter.finish() {
                        state.ready.push_back(rest);
                    }
                }
            }
        }
    }))
}
