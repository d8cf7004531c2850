//! Request builder.
//!
//! Every setter records the first error it hits instead of failing; the error
//! comes back from [`RequestBuilder::send`] on the [`Response`].

use std::sync::Arc;
use std::time::Duration;

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use tracing::{info, warn};
use url::Url;

use crate::codec::form;
use crate::hook::{AfterHook, BeforeHook, SharedAfterHook, SharedBeforeHook};
use crate::response::RawResponse;
use crate::{Codec, Context, HttpClient, HttpClientError, Payload, Response, Result, curl};

/// HTTP request builder.
///
/// Consumed by [`send`](RequestBuilder::send).
pub struct RequestBuilder<'a> {
    client: &'a HttpClient,
    err: Option<HttpClientError>,
    method: Method,
    url: Option<Url>,
    headers: HeaderMap,
    ctx: Context,
    codec: Codec,
    before: Option<SharedBeforeHook>,
    after: Option<SharedAfterHook>,
    debug: bool,
    reuse_body: bool,
    timeout: Option<Duration>,
}

impl<'a> RequestBuilder<'a> {
    /// Create a new request builder.
    pub(crate) fn new(client: &'a HttpClient, method: Result<Method>, url: String) -> Self {
        let config = client.config();
        let mut builder = Self {
            client,
            err: client.init_error().cloned(),
            method: Method::GET,
            url: None,
            headers: HeaderMap::new(),
            ctx: Context::background(),
            codec: Codec::Json,
            before: None,
            after: None,
            debug: config.debug,
            reuse_body: config.reuse_body,
            timeout: None,
        };

        match method {
            Ok(method) => builder.method = method,
            Err(e) => builder.record(e),
        }
        match build_url(config.base_url.as_deref(), &url) {
            Ok(url) => builder.url = Some(url),
            Err(e) => builder.record(e),
        }
        for (name, value) in &config.default_headers {
            builder = builder.header(name, value);
        }
        builder.encoder(Codec::Json)
    }

    fn record(&mut self, err: HttpClientError) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }

    /// Set a header, replacing any existing values for the name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::from_bytes(name.as_ref().as_bytes());
        let value = HeaderValue::from_str(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.record(HttpClientError::InvalidHeader(e.to_string())),
            (_, Err(e)) => self.record(HttpClientError::InvalidHeader(e.to_string())),
        }
        self
    }

    /// Set multiple headers, replacing existing values for each name.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let Some(url) = &mut self.url {
            url.query_pairs_mut().append_pair(key.as_ref(), value.as_ref());
        }
        self
    }

    /// Append multiple query parameters.
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if let Some(url) = &mut self.url {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k.as_ref(), v.as_ref());
            }
        }
        self
    }

    /// Replace the query string.
    ///
    /// Accepts a literal query string, [`FormValues`](crate::FormValues) or a
    /// serializable record, encoded with the form codec. Sequences repeat
    /// the key. Values or records that encode to nothing clear the query;
    /// an empty literal leaves it alone.
    pub fn set_query<'p>(mut self, query: impl Into<Payload<'p>>) -> Self {
        let query = query.into();
        match &query {
            Payload::Empty => return self,
            Payload::Text(text) if text.is_empty() => return self,
            _ => {}
        }
        match form::query_string(query) {
            Ok(query) => {
                if let Some(url) = &mut self.url {
                    url.set_query((!query.is_empty()).then_some(query.as_str()));
                }
            }
            Err(e) => self.record(e),
        }
        self
    }

    /// Select the body codec and set the matching `Content-Type`.
    pub fn encoder(mut self, codec: Codec) -> Self {
        match HeaderValue::from_str(codec.content_type()) {
            Ok(value) => {
                self.headers.insert(CONTENT_TYPE, value);
            }
            Err(e) => self.record(HttpClientError::InvalidHeader(e.to_string())),
        }
        self.codec = codec;
        self
    }

    /// Set the request context.
    pub fn context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// Set the before-hook for this request, replacing the client's.
    pub fn before(mut self, hook: impl BeforeHook + 'static) -> Self {
        self.before = Some(Arc::new(hook));
        self
    }

    /// Set the after-hook for this request, replacing the client's.
    pub fn after(mut self, hook: impl AfterHook + 'static) -> Self {
        self.after = Some(Arc::new(hook));
        self
    }

    /// Log this request as a curl command.
    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// Buffer the response body so it can be read more than once.
    pub fn reuse_body(mut self, enable: bool) -> Self {
        self.reuse_body = enable;
        self
    }

    /// Set a transport timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set bearer authentication.
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header(AUTHORIZATION, value)
    }

    /// Set basic authentication.
    pub fn basic_auth(self, username: impl AsRef<str>, password: Option<impl AsRef<str>>) -> Self {
        use base64::Engine;
        let credentials = match password {
            Some(p) => format!("{}:{}", username.as_ref(), p.as_ref()),
            None => format!("{}:", username.as_ref()),
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        self.header(AUTHORIZATION, format!("Basic {encoded}"))
    }

    /// Encode `body`, run the hooks and send the request.
    ///
    /// Never fails directly: any error is recorded on the returned
    /// [`Response`]. Pass `()` for no body.
    pub async fn send<'p>(self, body: impl Into<Payload<'p>>) -> Response {
        let Self {
            client,
            err,
            method,
            url,
            mut headers,
            ctx,
            codec,
            before,
            after,
            debug,
            reuse_body,
            timeout,
        } = self;

        if let Some(err) = err {
            return Response::failed(ctx, err);
        }
        let Some(url) = url else {
            return Response::failed(ctx, HttpClientError::InvalidUrl("missing URL".into()));
        };

        let payload = body.into();
        if payload.is_empty() && method.is_safe() {
            headers.remove(CONTENT_TYPE);
        }
        let body = match codec.encode(payload) {
            Ok(body) => body,
            Err(e) => return Response::failed(ctx, e),
        };

        let mut request = reqwest::Request::new(method, url);
        *request.headers_mut() = headers;
        *request.body_mut() = body;
        *request.timeout_mut() = timeout;

        let before = before.unwrap_or_else(|| client.before_hook());
        let ctx = match before.before(ctx.clone(), &mut request).await {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(error = %e, url = %request.url(), "Request rejected by before-hook");
                return Response::failed(ctx, e);
            }
        };

        if debug {
            info!(curl = %curl::render(&request), "HTTP request");
        }

        let mut raw = match client.execute(&ctx, request).await {
            Ok(response) => RawResponse::from_reqwest(response),
            Err(e) => return Response::failed(ctx, e),
        };

        if reuse_body {
            if let Err(e) = ctx.run(raw.bytes()).await {
                return Response::failed(ctx, e);
            }
        }

        let after = after.unwrap_or_else(|| client.after_hook());
        match after.after(ctx.clone(), &mut raw).await {
            Ok(ctx) => Response::new(raw, ctx, None, reuse_body),
            Err(e) => {
                warn!(error = %e, status = %raw.status(), "Response rejected by after-hook");
                Response::new(raw, ctx, Some(e), reuse_body)
            }
        }
    }
}

impl std::fmt::Debug for RequestBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("codec", &self.codec)
            .field("err", &self.err)
            .finish_non_exhaustive()
    }
}

fn build_url(base: Option<&str>, url: &str) -> Result<Url> {
    match base {
        Some(base) => Url::parse(base)
            .and_then(|base| base.join(url))
            .map_err(|e| HttpClientError::InvalidUrl(format!("{url}: {e}"))),
        None => Url::parse(url).map_err(|e| HttpClientError::InvalidUrl(format!("{url}: {e}"))),
    }
}
