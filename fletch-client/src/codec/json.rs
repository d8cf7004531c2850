//! JSON codec.

use serde::de::DeserializeOwned;

use super::{pooled_body, unsupported};
use crate::{HttpClientError, Payload, Result};

pub(crate) fn encode(payload: Payload<'_>) -> Result<Option<reqwest::Body>> {
    match payload {
        Payload::Record(record) => pooled_body(|buf| record.encode_json(buf)),
        Payload::Form(values) => pooled_body(|buf| {
            serde_json::to_writer(buf, &values).map_err(|e| HttpClientError::encode("json", e))
        }),
        Payload::Text(text) => pooled_body(|buf| {
            serde_json::to_writer(buf, &*text).map_err(|e| HttpClientError::encode("json", e))
        }),
        other => Err(unsupported("json", &other)),
    }
}

/// Decode a JSON body.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| HttpClientError::decode("json", e))
}
