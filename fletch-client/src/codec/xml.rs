//! XML codec.

use serde::de::DeserializeOwned;

use super::{pooled_body, unsupported};
use crate::{HttpClientError, Payload, Result};

pub(crate) fn encode(payload: Payload<'_>) -> Result<Option<reqwest::Body>> {
    match payload {
        Payload::Record(record) => pooled_body(|buf| record.encode_xml(buf)),
        other => Err(unsupported("xml", &other)),
    }
}

/// Decode an XML body.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    quick_xml::de::from_reader(body).map_err(|e| HttpClientError::decode("xml", e))
}
