//! Transaction result decoding.
//!
//! Contract results are UTF-8 text, usually JSON. Decoding is pure: the input
//! is never modified and malformed input is always a `Decode` error, never an
//! empty success.

use serde::de::DeserializeOwned;

use crate::fabric::types::{GatewayError, GatewayResult};

/// Decode result bytes as UTF-8 text.
pub fn decode_text(bytes: &[u8]) -> GatewayResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| GatewayError::Decode(format!("result is not valid UTF-8: {}", e)))
}

/// Decode result bytes as a JSON value of type `T`.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> GatewayResult<T> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| GatewayError::Decode(format!("result is not valid UTF-8: {}", e)))?;
    if text.trim().is_empty() {
        return Err(GatewayError::Decode("result is empty".to_string()));
    }
    serde_json::from_str(text)
        .map_err(|e| GatewayError::Decode(format!("result is not valid JSON: {}", e)))
}
