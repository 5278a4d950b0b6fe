//! Payload codec abstraction
//!
//! Result payloads are opaque to the coordination core: it stores and returns
//! bytes. The codec is the seam through which the consumer-facing facade
//! encodes values on the way in and decodes them on the way out.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::CodecResult;

/// Encodes and decodes result payloads.
///
/// Object-safe so backends can hold `Arc<dyn PayloadCodec>`; typed access
/// goes through [`encode_payload`] / [`decode_payload`], which bridge via
/// `serde_json::Value`.
pub trait PayloadCodec: Send + Sync {
    /// MIME-style label for the wire representation
    fn content_type(&self) -> &'static str;

    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> CodecResult<Value>;
}

/// JSON payload codec
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<Value> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Encode a typed value through a codec
pub fn encode_payload<T: Serialize>(codec: &dyn PayloadCodec, value: &T) -> CodecResult<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    codec.encode(&value)
}

/// Decode stored bytes back into a typed value
pub fn decode_payload<T: DeserializeOwned>(
    codec: &dyn PayloadCodec,
    bytes: &[u8],
) -> CodecResult<T> {
    let value = codec.decode(bytes)?;
    Ok(serde_json::from_value(value)?)
}
