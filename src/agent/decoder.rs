//! Reassembles a streamed agent response into text

use futures::{Stream, StreamExt};
use tracing::debug;

use super::{
    chunk::AgentChunk,
    errors::{AgentResult, DecodeError},
};

/// Consume the chunk stream to completion and decode the concatenated bytes
/// as UTF-8.
///
/// Chunks are appended in arrival order. The first error item aborts the
/// decode and the partial buffer is dropped.
pub async fn decode_response<S>(mut stream: S) -> AgentResult<String>
where
    S: Stream<Item = AgentResult<AgentChunk>> + Unpin,
{
    let mut buffer: Vec<u8> = Vec::new();
    let mut chunk_count = 0usize;

    while let Some(item) = stream.next().await {
        let chunk = item?;
        buffer.extend_from_slice(chunk.as_bytes());
        chunk_count += 1;
    }

    debug!(
        "Decoded agent response: {} chunks, {} bytes",
        chunk_count,
        buffer.len()
    );

    let text = String::from_utf8(buffer).map_err(DecodeError::from)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::errors::AgentError;
    use futures::stream;

    fn raw(text: &str) -> AgentResult<AgentChunk> {
        Ok(AgentChunk::Bytes(text.as_bytes().to_vec()))
    }

    #[tokio::test]
    async fn test_decode_concatenates_in_order() {
        let chunks = vec![raw("Hel"), raw("lo, "), raw("世界")];
        let text = decode_response(stream::iter(chunks)).await.unwrap();
        assert_eq!(text, "Hello, 世界");
    }

    #[tokio::test]
    async fn test_decode_mixes_raw_and_payload_chunks() {
        let chunks = vec![
            raw("設備"),
            Ok(AgentChunk::Payload {
                payload: "狀態正常".as_bytes().to_vec(),
            }),
        ];
        let text = decode_response(stream::iter(chunks)).await.unwrap();
        assert_eq!(text, "設備狀態正常");
    }

    #[tokio::test]
    async fn test_multibyte_sequence_split_across_chunks() {
        let bytes = "世".as_bytes();
        let chunks = vec![
            Ok(AgentChunk::Bytes(bytes[..1].to_vec())),
            Ok(AgentChunk::Payload {
                payload: bytes[1..].to_vec(),
            }),
        ];
        let text = decode_response(stream::iter(chunks)).await.unwrap();
        assert_eq!(text, "世");
    }

    #[tokio::test]
    async fn test_empty_stream_decodes_to_empty_string() {
        let chunks: Vec<AgentResult<AgentChunk>> = Vec::new();
        assert_eq!(decode_response(stream::iter(chunks)).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_malformed_chunk_aborts_decode() {
        let chunks = vec![
            raw("partial "),
            Err(AgentError::from(DecodeError::MalformedChunk("object with keys [trace]".into()))),
            raw("ignored"),
        ];
        let err = decode_response(stream::iter(chunks)).await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::DecodeError(DecodeError::MalformedChunk(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_utf8_fails() {
        let chunks = vec![Ok(AgentChunk::Bytes(vec![0xff, 0xfe]))];
        let err = decode_response(stream::iter(chunks)).await.unwrap_err();
        assert!(matches!(err, AgentError::DecodeError(DecodeError::InvalidUtf8(_))));
    }
}
