//! Protobuf codec.

use super::unsupported;
use crate::buffer_pool::acquire_buffer_for_bytes;
use crate::{HttpClientError, Payload, Result};

pub(crate) fn encode(payload: Payload<'_>) -> Result<Option<reqwest::Body>> {
    let message = match payload {
        Payload::Message(message) => message,
        other => return Err(unsupported("protobuf", &other)),
    };
    let mut buf = acquire_buffer_for_bytes(message.message_len());
    message
        .encode_message(&mut buf)
        .map_err(|e| HttpClientError::encode("protobuf", e))?;
    Ok(Some(reqwest::Body::from(buf.into_bytes())))
}

/// Decode a protobuf body.
///
/// The target must be a `prost::Message`; anything else does not compile.
pub fn decode<M: prost::Message + Default>(body: &[u8]) -> Result<M> {
    M::decode(body).map_err(|e| HttpClientError::decode("protobuf", e))
}
