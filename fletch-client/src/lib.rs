//! # Fletch HTTP Client
//!
//! A fluent HTTP request pipeline: build a request, encode its body with a
//! pluggable codec, run it through before/after hooks, dispatch it over a
//! shared connection pool and decode the response.
//!
//! ## Features
//!
//! - **Codecs**: JSON, form, XML, YAML, protobuf and raw streams
//! - **Hooks**: one before-hook and one after-hook per request, with
//!   client-wide defaults
//! - **Context**: cancellation, deadlines and typed values per request
//! - **Pooled buffers**: request and response bodies reuse size-classed buffers
//! - **Deferred errors**: setters never fail; errors come back on the response
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fletch_client::{HttpClient, HttpClientConfig};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new(HttpClientConfig::default());
//!
//!     let mut response = client
//!         .get("https://api.example.com/users/1")
//!         .send(())
//!         .await
//!         .into_result()?;
//!
//!     let user: User = response.bind_json().await?;
//!     println!("Name: {}", user.name);
//!     Ok(())
//! }
//! ```
//!
//! ## Form Bodies and Hooks
//!
//! ```rust,no_run
//! use fletch_client::{Codec, HttpClient, HttpClientConfig, PassThrough, Payload, StatusCheck, Timed};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Signup {
//!     name: String,
//!     age: Vec<u32>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HttpClientConfig::builder()
//!         .before(Timed::new(PassThrough))
//!         .after(Timed::new(StatusCheck::success()))
//!         .build();
//!     let client = HttpClient::new(config);
//!
//!     let signup = Signup { name: "caster".into(), age: vec![1, 3, 5] };
//!     let response = client
//!         .post("https://api.example.com/signup")
//!         .encoder(Codec::Form)
//!         .send(Payload::record(&signup))
//!         .await;
//!
//!     println!("took {:?}", response.latency());
//!     Ok(())
//! }
//! ```

pub mod buffer_pool;
mod client;
pub mod codec;
mod config;
mod context;
pub mod curl;
mod error;
pub mod hook;
pub mod mime;
mod payload;
mod request;
mod response;

pub use client::{
    HttpClient, default_client, delete, get, head, options, patch, post, put, request,
};
pub use codec::{Codec, FormValues};
pub use config::{HttpClientConfig, HttpClientConfigBuilder};
pub use context::Context;
pub use error::{HttpClientError, Result};
pub use hook::{
    AfterHook, BeforeHook, Logging, PassThrough, RequestId, StatusCheck, Timed, after_fn,
    before_fn, latency,
};
#[cfg(feature = "protobuf")]
pub use payload::ProtoMessage;
pub use payload::{Payload, Record};
pub use request::RequestBuilder;
pub use response::{RawResponse, Response};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use tokio_util::sync::CancellationToken;
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use fletch_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::HttpClient;
    pub use crate::codec::{Codec, FormValues};
    pub use crate::config::{HttpClientConfig, HttpClientConfigBuilder};
    pub use crate::context::Context;
    pub use crate::error::{HttpClientError, Result};
    pub use crate::hook::{AfterHook, BeforeHook, PassThrough, StatusCheck, Timed};
    pub use crate::payload::Payload;
    pub use crate::request::RequestBuilder;
    pub use crate::response::{RawResponse, Response};
    pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
}
