//! Request payloads.
//!
//! A [`Payload`] is the closed set of values a request body can be built
//! from. Each [`Codec`](crate::Codec) accepts a subset of the variants and
//! rejects the rest with [`HttpClientError::UnsupportedData`]:
//!
//! | Payload | json | form | xml | yaml | protobuf | stream |
//! |---|---|---|---|---|---|---|
//! | `Empty` | ✓ | ✓ | ✓ | ✓ | ✓ | ✓ |
//! | `Record` | ✓ | ✓ | ✓ | ✓ | | |
//! | `Form` | ✓ | ✓ | | ✓ | | |
//! | `Text` | ✓ | ✓ | | | | ✓ |
//! | `Bytes` | | | | | | ✓ |
//! | `Stream` | | | | | | ✓ |
//! | `Message` | | | | | ✓ | |
//!
//! JSON writes text as a JSON string. Raw bytes are already an encoded body
//! and only the stream codec sends them.

use std::borrow::Cow;

use bytes::Bytes;
use serde::Serialize;

use crate::buffer_pool::PooledBuffer;
use crate::codec::FormValues;
use crate::{HttpClientError, Result};

/// A serializable record.
///
/// Implemented for every `Serialize + Sync` type; it lets a record travel as
/// a trait object until the request's codec is known.
pub trait Record: Sync {
    /// Serialize into a JSON value tree.
    fn to_value(&self) -> Result<serde_json::Value>;

    /// Write the record as JSON.
    fn encode_json(&self, out: &mut PooledBuffer) -> Result<()>;

    /// Write the record as XML.
    #[cfg(feature = "xml")]
    fn encode_xml(&self, out: &mut PooledBuffer) -> Result<()>;

    /// Write the record as YAML.
    #[cfg(feature = "yaml")]
    fn encode_yaml(&self, out: &mut PooledBuffer) -> Result<()>;
}

impl<T: Serialize + Sync> Record for T {
    fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| HttpClientError::encode("form", e))
    }

    fn encode_json(&self, out: &mut PooledBuffer) -> Result<()> {
        serde_json::to_writer(out, self).map_err(|e| HttpClientError::encode("json", e))
    }

    #[cfg(feature = "xml")]
    fn encode_xml(&self, out: &mut PooledBuffer) -> Result<()> {
        quick_xml::se::to_writer(out, self)
            .map(|_| ())
            .map_err(|e| HttpClientError::encode("xml", e))
    }

    #[cfg(feature = "yaml")]
    fn encode_yaml(&self, out: &mut PooledBuffer) -> Result<()> {
        serde_yaml::to_writer(out, self).map_err(|e| HttpClientError::encode("yaml", e))
    }
}

/// A protobuf message.
///
/// Implemented for every `prost::Message`.
#[cfg(feature = "protobuf")]
pub trait ProtoMessage: Sync {
    /// Encoded length in bytes.
    fn message_len(&self) -> usize;

    /// Append the encoded message to `buf`.
    fn encode_message(&self, buf: &mut bytes::BytesMut) -> std::result::Result<(), prost::EncodeError>;
}

#[cfg(feature = "protobuf")]
impl<M: prost::Message> ProtoMessage for M {
    fn message_len(&self) -> usize {
        prost::Message::encoded_len(self)
    }

    fn encode_message(&self, buf: &mut bytes::BytesMut) -> std::result::Result<(), prost::EncodeError> {
        prost::Message::encode(self, buf)
    }
}

/// A request body value, before encoding.
pub enum Payload<'a> {
    /// No body.
    Empty,
    /// A serializable record.
    Record(&'a dyn Record),
    /// Form values.
    Form(FormValues),
    /// A literal string: a JSON string for the json codec, a raw query
    /// string for the form codec, raw text for the stream codec.
    Text(Cow<'a, str>),
    /// Raw bytes.
    Bytes(Bytes),
    /// A body stream, passed through unchanged.
    Stream(reqwest::Body),
    /// A protobuf message.
    #[cfg(feature = "protobuf")]
    Message(&'a dyn ProtoMessage),
}

impl<'a> Payload<'a> {
    /// Wrap a serializable record.
    pub fn record<T: Serialize + Sync>(value: &'a T) -> Self {
        Self::Record(value)
    }

    /// Wrap a protobuf message.
    #[cfg(feature = "protobuf")]
    pub fn message<M: prost::Message>(message: &'a M) -> Self {
        Self::Message(message)
    }

    /// Check if this is the empty payload.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Short name of the payload kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty payload",
            Self::Record(_) => "record",
            Self::Form(_) => "form values",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Stream(_) => "stream",
            #[cfg(feature = "protobuf")]
            Self::Message(_) => "protobuf message",
        }
    }
}

impl std::fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Form(values) => f.debug_tuple("Form").field(values).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

impl From<()> for Payload<'_> {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(Cow::Borrowed(text))
    }
}

impl From<String> for Payload<'_> {
    fn from(text: String) -> Self {
        Self::Text(Cow::Owned(text))
    }
}

impl From<Vec<u8>> for Payload<'_> {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Payload<'_> {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(bytes))
    }
}

impl From<Bytes> for Payload<'_> {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<FormValues> for Payload<'_> {
    fn from(values: FormValues) -> Self {
        Self::Form(values)
    }
}

impl From<reqwest::Body> for Payload<'_> {
    fn from(body: reqwest::Body) -> Self {
        Self::Stream(body)
    }
}
