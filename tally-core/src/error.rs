//! Core error types

use thiserror::Error;

/// Result type for payload codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Errors raised while encoding or decoding result payloads
#[derive(Debug, Error)]
pub enum CodecError {
    /// A value could not be encoded into the wire representation
    #[error("Failed to encode payload: {0}")]
    Encode(String),

    /// Stored bytes could not be decoded back into a value
    #[error("Failed to decode payload: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_eof() {
            CodecError::Decode(err.to_string())
        } else {
            CodecError::Encode(err.to_string())
        }
    }
}
