//! LSP message framing layer
//!
//! Handles LSP-specific message framing using Content-Length headers
//! as specified in the Language Server Protocol specification.
//!
//! LSP message framing format:
//! Content-Length: <length>\r\n\r\n<content>

use tokio_util::bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

/// Maximum message size to prevent memory exhaustion
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024; // 16MB

const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";

/// Error types for LSP framing
#[derive(Debug, thiserror::Error)]
pub enum LspFramingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid LSP message format: {0}")]
    InvalidFormat(String),

    #[error("Invalid content length: {0}")]
    InvalidContentLength(String),

    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Message body is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Codec turning a byte stream into LSP message bodies and back
#[derive(Debug, Default)]
pub struct LspCodec {
    /// Content length of the message whose headers were already consumed
    pending_length: Option<usize>,
}

impl LspCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_content_length(header: &str) -> Result<usize, LspFramingError> {
        for line in header.split("\r\n") {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            if !name.trim().eq_ignore_ascii_case("Content-Length") {
                continue;
            }

            let value = value.trim();
            let length = value
                .parse::<usize>()
                .map_err(|_| LspFramingError::InvalidContentLength(value.to_string()))?;

            if length > MAX_MESSAGE_SIZE {
                return Err(LspFramingError::MessageTooLarge {
                    size: length,
                    max: MAX_MESSAGE_SIZE,
                });
            }
            return Ok(length);
        }

        Err(LspFramingError::InvalidFormat(
            "Missing Content-Length header".to_string(),
        ))
    }
}

impl Decoder for LspCodec {
    type Item = String;
    type Error = LspFramingError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let content_length = match self.pending_length {
            Some(length) => length,
            None => {
                let Some(header_end) = src
                    .windows(HEADER_SEPARATOR.len())
                    .position(|window| window == HEADER_SEPARATOR)
                else {
                    return Ok(None);
                };

                let header = String::from_utf8_lossy(&src[..header_end]).into_owned();
                let length = Self::parse_content_length(&header)?;
                src.advance(header_end + HEADER_SEPARATOR.len());
                self.pending_length = Some(length);
                length
            }
        };

        if src.len() < content_length {
            trace!(
                "LspCodec: Incomplete message - need {} more bytes",
                content_length - src.len()
            );
            src.reserve(content_length - src.len());
            return Ok(None);
        }

        self.pending_length = None;
        let body = src.split_to(content_length);
        let message = String::from_utf8(body.to_vec())?;
        trace!("LspCodec: Parsed complete message ({} bytes)", content_length);
        Ok(Some(message))
    }
}

impl Encoder<String> for LspCodec {
    type Error = LspFramingError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let header = format!("Content-Length: {}\r\n\r\n", item.len());
        dst.reserve(header.len() + item.len());
        dst.put_slice(header.as_bytes());
        dst.put_slice(item.as_bytes());
        Ok(())
    }
}
