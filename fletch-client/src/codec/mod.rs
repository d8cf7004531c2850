//! Content codecs.
//!
//! A [`Codec`] turns a [`Payload`] into a request body and declares the
//! `Content-Type` that goes with it. Decoding lives in the per-codec
//! submodules ([`json::decode`], [`form::decode`], ...) and is what the
//! `Response::bind_*` helpers call.

use std::borrow::Cow;

use crate::buffer_pool::{BufferSize, PooledBuffer, acquire_buffer};
use crate::{HttpClientError, Payload, Result, mime};

pub mod form;
pub mod json;
#[cfg(feature = "protobuf")]
pub mod proto;
pub mod stream;
#[cfg(feature = "xml")]
pub mod xml;
#[cfg(feature = "yaml")]
pub mod yaml;

pub use form::FormValues;

/// Request body codec.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Codec {
    /// `application/json;charset=utf-8`
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
    /// `application/xml;charset=utf-8`
    #[cfg(feature = "xml")]
    Xml,
    /// `application/x-yaml;charset=utf-8`
    #[cfg(feature = "yaml")]
    Yaml,
    /// `application/x-protobuf`
    #[cfg(feature = "protobuf")]
    Protobuf,
    /// Raw bytes tagged with a caller-chosen content type.
    Stream(Cow<'static, str>),
}

impl Codec {
    /// Stream codec with the given content type.
    pub fn stream(content_type: impl Into<Cow<'static, str>>) -> Self {
        Self::Stream(content_type.into())
    }

    /// Stream codec tagged `application/octet-stream`.
    pub fn octet_stream() -> Self {
        Self::Stream(Cow::Borrowed(mime::OCTET_STREAM))
    }

    /// Codec name used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Form => "form",
            #[cfg(feature = "xml")]
            Self::Xml => "xml",
            #[cfg(feature = "yaml")]
            Self::Yaml => "yaml",
            #[cfg(feature = "protobuf")]
            Self::Protobuf => "protobuf",
            Self::Stream(_) => "stream",
        }
    }

    /// The `Content-Type` this codec produces.
    pub fn content_type(&self) -> &str {
        match self {
            Self::Json => mime::JSON,
            Self::Form => mime::FORM,
            #[cfg(feature = "xml")]
            Self::Xml => mime::XML,
            #[cfg(feature = "yaml")]
            Self::Yaml => mime::YAML,
            #[cfg(feature = "protobuf")]
            Self::Protobuf => mime::PROTOBUF,
            Self::Stream(content_type) => content_type,
        }
    }

    /// Encode a payload into a request body.
    ///
    /// The empty payload encodes to no body for every codec. Buffered bodies
    /// own a pooled buffer that returns to the pool when the body is dropped.
    pub fn encode(&self, payload: Payload<'_>) -> Result<Option<reqwest::Body>> {
        if payload.is_empty() {
            return Ok(None);
        }
        match self {
            Self::Json => json::encode(payload),
            Self::Form => form::encode(payload),
            #[cfg(feature = "xml")]
            Self::Xml => xml::encode(payload),
            #[cfg(feature = "yaml")]
            Self::Yaml => yaml::encode(payload),
            #[cfg(feature = "protobuf")]
            Self::Protobuf => proto::encode(payload),
            Self::Stream(_) => stream::encode(payload),
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.content_type())
    }
}

pub(crate) fn unsupported(codec: &'static str, payload: &Payload<'_>) -> HttpClientError {
    HttpClientError::UnsupportedData {
        codec,
        payload: payload.kind(),
    }
}

/// Run `write` against a fresh pooled buffer and wrap the result as a body.
pub(crate) fn pooled_body<F>(write: F) -> Result<Option<reqwest::Body>>
where
    F: FnOnce(&mut PooledBuffer) -> Result<()>,
{
    let mut buf = acquire_buffer(BufferSize::Small);
    write(&mut buf)?;
    Ok(Some(reqwest::Body::from(buf.into_bytes())))
}
