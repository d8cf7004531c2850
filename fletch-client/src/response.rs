//! HTTP response wrapper.

use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use serde::de::DeserializeOwned;
use url::Url;

use crate::buffer_pool::acquire_buffer_for_bytes;
use crate::codec::{self, FormValues};
use crate::{Context, HttpClientError, Result, hook};

/// Transport response as seen by after-hooks.
///
/// The body starts out as a stream. [`RawResponse::bytes`] drains it into a
/// pooled buffer once and keeps the buffer, so later reads see the same bytes.
#[derive(Debug)]
pub struct RawResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    url: Url,
    body: Body,
}

#[derive(Debug)]
enum Body {
    Streaming(reqwest::Response),
    Buffered(Bytes),
    Consumed,
}

impl RawResponse {
    /// Wrap a transport response without reading its body.
    pub fn from_reqwest(response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            version: response.version(),
            headers: response.headers().clone(),
            url: response.url().clone(),
            body: Body::Streaming(response),
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the response headers mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get the final URL, after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Check if the body has been read into memory.
    pub fn is_buffered(&self) -> bool {
        matches!(self.body, Body::Buffered(_))
    }

    /// Read the whole body, keeping it available for later reads.
    pub async fn bytes(&mut self) -> Result<Bytes> {
        let bytes = self.take_bytes().await?;
        self.body = Body::Buffered(bytes.clone());
        Ok(bytes)
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Body::Buffered(body.into());
    }

    /// Read the whole body and leave nothing behind.
    pub(crate) async fn take_bytes(&mut self) -> Result<Bytes> {
        match std::mem::replace(&mut self.body, Body::Consumed) {
            Body::Streaming(response) => drain(response).await,
            Body::Buffered(bytes) => Ok(bytes),
            Body::Consumed => Err(HttpClientError::EmptyResponse),
        }
    }
}

async fn drain(mut response: reqwest::Response) -> Result<Bytes> {
    let hint = response
        .content_length()
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(0);
    let mut buf = acquire_buffer_for_bytes(hint);
    while let Some(chunk) = response.chunk().await? {
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.into_bytes())
}

/// Result of [`RequestBuilder::send`](crate::RequestBuilder::send).
///
/// Holds the raw response, the final context and any recorded error. Once an
/// error is recorded, every body operation returns it without touching the
/// body.
#[derive(Debug)]
pub struct Response {
    raw: Option<RawResponse>,
    ctx: Context,
    err: Option<HttpClientError>,
    reuse_body: bool,
}

impl Response {
    pub(crate) fn new(
        raw: RawResponse,
        ctx: Context,
        err: Option<HttpClientError>,
        reuse_body: bool,
    ) -> Self {
        Self {
            raw: Some(raw),
            ctx,
            err,
            reuse_body,
        }
    }

    pub(crate) fn failed(ctx: Context, err: HttpClientError) -> Self {
        Self {
            raw: None,
            ctx,
            err: Some(err),
            reuse_body: false,
        }
    }

    /// The recorded error, if any.
    pub fn err(&self) -> Option<&HttpClientError> {
        self.err.as_ref()
    }

    /// The context returned by the last hook that ran.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Latency recorded by the [`Timed`](crate::Timed) hooks, or zero.
    pub fn latency(&self) -> Duration {
        hook::latency(&self.ctx)
    }

    /// The raw response, if the transport call succeeded.
    pub fn raw(&self) -> Option<&RawResponse> {
        self.raw.as_ref()
    }

    /// Get the status code.
    pub fn status(&self) -> Option<StatusCode> {
        self.raw.as_ref().map(RawResponse::status)
    }

    /// Check if the response was successful (2xx) with no recorded error.
    pub fn is_success(&self) -> bool {
        self.err.is_none() && self.status().is_some_and(|s| s.is_success())
    }

    /// Get the response headers.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.raw.as_ref().map(RawResponse::headers)
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers()?
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the response URL.
    pub fn url(&self) -> Option<&Url> {
        self.raw.as_ref().map(RawResponse::url)
    }

    /// Get the content type if available.
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE)
    }

    /// Get the content length if available.
    pub fn content_length(&self) -> Option<u64> {
        self.header(http::header::CONTENT_LENGTH)
            .and_then(|v| v.parse().ok())
    }

    /// Turn a recorded error into `Err`.
    pub fn into_result(self) -> Result<Self> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    /// Read the whole body.
    ///
    /// The first call drains the body into a pooled buffer; later calls
    /// return the same bytes. Draining stops early when the context is
    /// cancelled or its deadline passes.
    pub async fn read_body(&mut self) -> Result<Bytes> {
        let (raw, ctx) = self.parts()?;
        ctx.run(raw.bytes()).await
    }

    /// Read the body as UTF-8 text.
    pub async fn text(&mut self) -> Result<String> {
        let bytes = self.read_body().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| HttpClientError::decode("text", e))
    }

    /// Decode the body with `decode`.
    ///
    /// Without body reuse a still-streaming body is consumed, and a second
    /// bind returns [`HttpClientError::EmptyResponse`]. A body already read
    /// by [`read_body`](Self::read_body) stays buffered.
    pub async fn bind<T, F>(&mut self, decode: F) -> Result<T>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        let keep = self.reuse_body;
        let (raw, ctx) = self.parts()?;
        let body = if keep || raw.is_buffered() {
            ctx.run(raw.bytes()).await?
        } else {
            ctx.run(raw.take_bytes()).await?
        };
        decode(&body)
    }

    /// Decode a JSON body.
    pub async fn bind_json<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.bind(codec::json::decode).await
    }

    /// Decode a flat form body into a record.
    pub async fn bind_form<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.bind(codec::form::decode).await
    }

    /// Decode a form body into [`FormValues`].
    pub async fn bind_form_values(&mut self) -> Result<FormValues> {
        self.bind(codec::form::decode_values).await
    }

    /// Decode an XML body.
    #[cfg(feature = "xml")]
    pub async fn bind_xml<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.bind(codec::xml::decode).await
    }

    /// Decode a YAML body.
    #[cfg(feature = "yaml")]
    pub async fn bind_yaml<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.bind(codec::yaml::decode).await
    }

    /// Decode a protobuf body.
    #[cfg(feature = "protobuf")]
    pub async fn bind_proto<M: prost::Message + Default>(&mut self) -> Result<M> {
        self.bind(codec::proto::decode).await
    }

    fn parts(&mut self) -> Result<(&mut RawResponse, &Context)> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        let raw = self.raw.as_mut().ok_or(HttpClientError::EmptyResponse)?;
        Ok((raw, &self.ctx))
    }
}
