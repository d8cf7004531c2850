//! Raw stream codec.

use super::unsupported;
use crate::{Payload, Result};

pub(crate) fn encode(payload: Payload<'_>) -> Result<Option<reqwest::Body>> {
    match payload {
        Payload::Bytes(bytes) => Ok(Some(reqwest::Body::from(bytes))),
        Payload::Text(text) => Ok(Some(reqwest::Body::from(text.into_owned()))),
        Payload::Stream(body) => Ok(Some(body)),
        other => Err(unsupported("stream", &other)),
    }
}
