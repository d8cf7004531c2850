//! HTTP Client error types.

use http::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for HTTP client operations.
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// HTTP client errors.
///
/// Every error is cheap to clone: a [`Response`](crate::Response) that
/// recorded one hands the same value back from every later body read or bind.
#[derive(Debug, Clone, Error)]
pub enum HttpClientError {
    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid proxy URL in the client configuration.
    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),

    /// Invalid HTTP method.
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The underlying transport could not be built.
    #[error("Failed to build client: {0}")]
    ClientBuild(String),

    /// The selected codec does not accept this kind of payload.
    #[error("unsupported data type: {codec} codec cannot encode {payload}")]
    UnsupportedData {
        /// Codec name.
        codec: &'static str,
        /// Payload kind.
        payload: &'static str,
    },

    /// Payload serialization error.
    #[error("{codec} encode error: {message}")]
    Encode {
        /// Codec name.
        codec: &'static str,
        /// Error message.
        message: String,
    },

    /// Response body deserialization error.
    #[error("{codec} decode error: {message}")]
    Decode {
        /// Codec name.
        codec: &'static str,
        /// Error message.
        message: String,
    },

    /// The response or its body is not available.
    #[error("unexpected empty response")]
    EmptyResponse,

    /// The context deadline elapsed before the response arrived.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The context was cancelled.
    #[error("Request cancelled")]
    Cancelled,

    /// Rejected by a before or after hook.
    #[error("Hook error: {0}")]
    Hook(String),

    /// Rejected by a status-checking after hook.
    #[error("unexpected status code: {status}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: StatusCode,
    },

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[source] Arc<reqwest::Error>),
}

impl From<reqwest::Error> for HttpClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Arc::new(err))
    }
}

impl HttpClientError {
    /// Create a hook rejection error.
    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook(message.into())
    }

    pub(crate) fn encode(codec: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Encode {
            codec,
            message: err.to_string(),
        }
    }

    pub(crate) fn decode(codec: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            codec,
            message: err.to_string(),
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_)) || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect())
    }

    /// Check if the context was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if a codec refused the payload kind.
    pub fn is_unsupported_data(&self) -> bool {
        matches!(self, Self::UnsupportedData { .. })
    }

    /// Get the HTTP status code if this error carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status } => Some(status.as_u16()),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
