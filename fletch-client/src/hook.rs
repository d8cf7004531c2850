//! Before and after hooks.
//!
//! A request runs exactly one [`BeforeHook`] and one [`AfterHook`]. The
//! effective hook is the request-level one if set, otherwise the client's,
//! otherwise [`PassThrough`]. Setting a hook replaces the previous one; to
//! combine behavior, wrap the inner hook explicitly (see [`Timed`]).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use http::{HeaderName, HeaderValue, StatusCode};
use reqwest::Request;

use crate::{Context, HttpClientError, RawResponse, Result};

/// Runs before a request is dispatched.
///
/// Returning an error aborts the request; the error is recorded on the
/// response.
#[async_trait]
pub trait BeforeHook: Send + Sync {
    /// Inspect or modify the request, and return the context to continue with.
    async fn before(&self, ctx: Context, request: &mut Request) -> Result<Context>;
}

/// Runs after a response is received.
///
/// Returning an error marks the response as failed even though the transport
/// call succeeded.
#[async_trait]
pub trait AfterHook: Send + Sync {
    /// Validate the response, and return the context to continue with.
    async fn after(&self, ctx: Context, response: &mut RawResponse) -> Result<Context>;
}

/// Shared before-hook handle.
pub type SharedBeforeHook = Arc<dyn BeforeHook>;

/// Shared after-hook handle.
pub type SharedAfterHook = Arc<dyn AfterHook>;

/// Hook that changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

#[async_trait]
impl BeforeHook for PassThrough {
    async fn before(&self, ctx: Context, _request: &mut Request) -> Result<Context> {
        Ok(ctx)
    }
}

#[async_trait]
impl AfterHook for PassThrough {
    async fn after(&self, ctx: Context, _response: &mut RawResponse) -> Result<Context> {
        Ok(ctx)
    }
}

/// Before-hook built from a closure. See [`before_fn`].
#[derive(Clone)]
pub struct BeforeFn<F>(F);

/// Build a before-hook from a closure.
///
/// ```rust
/// use fletch_client::{Context, before_fn};
///
/// let hook = before_fn(|ctx: Context, request: &mut reqwest::Request| {
///     request.headers_mut().insert("x-trace", "1".parse().unwrap());
///     Ok(ctx)
/// });
/// ```
pub fn before_fn<F>(f: F) -> BeforeFn<F>
where
    F: Fn(Context, &mut Request) -> Result<Context> + Send + Sync,
{
    BeforeFn(f)
}

#[async_trait]
impl<F> BeforeHook for BeforeFn<F>
where
    F: Fn(Context, &mut Request) -> Result<Context> + Send + Sync,
{
    async fn before(&self, ctx: Context, request: &mut Request) -> Result<Context> {
        (self.0)(ctx, request)
    }
}

/// After-hook built from a closure. See [`after_fn`].
#[derive(Clone)]
pub struct AfterFn<F>(F);

/// Build an after-hook from a closure.
pub fn after_fn<F>(f: F) -> AfterFn<F>
where
    F: Fn(Context, &mut RawResponse) -> Result<Context> + Send + Sync,
{
    AfterFn(f)
}

#[async_trait]
impl<F> AfterHook for AfterFn<F>
where
    F: Fn(Context, &mut RawResponse) -> Result<Context> + Send + Sync,
{
    async fn after(&self, ctx: Context, response: &mut RawResponse) -> Result<Context> {
        (self.0)(ctx, response)
    }
}

/// After-hook that rejects unexpected status codes.
#[derive(Debug, Clone)]
pub struct StatusCheck {
    accept: StatusRule,
}

#[derive(Debug, Clone)]
enum StatusRule {
    Success,
    Exact(Vec<StatusCode>),
}

impl StatusCheck {
    /// Accept any 2xx status.
    pub fn success() -> Self {
        Self {
            accept: StatusRule::Success,
        }
    }

    /// Accept only the listed statuses.
    pub fn exact(statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        Self {
            accept: StatusRule::Exact(statuses.into_iter().collect()),
        }
    }

    /// Check whether `status` passes.
    pub fn accepts(&self, status: StatusCode) -> bool {
        match &self.accept {
            StatusRule::Success => status.is_success(),
            StatusRule::Exact(statuses) => statuses.contains(&status),
        }
    }
}

impl Default for StatusCheck {
    fn default() -> Self {
        Self::success()
    }
}

#[async_trait]
impl AfterHook for StatusCheck {
    async fn after(&self, ctx: Context, response: &mut RawResponse) -> Result<Context> {
        let status = response.status();
        if self.accepts(status) {
            Ok(ctx)
        } else {
            Err(HttpClientError::UnexpectedStatus { status })
        }
    }
}

/// Latency measured by the [`Timed`] hooks, stored in the context.
#[derive(Debug, Clone)]
pub struct RequestTimer {
    started: Instant,
    elapsed_nanos: Arc<AtomicU64>,
}

impl RequestTimer {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            elapsed_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    fn stop(&self) {
        let nanos = u64::try_from(self.started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_nanos.store(nanos, Ordering::Release);
    }

    /// Recorded latency; zero until the after-hook has completed.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::Acquire))
    }
}

/// Latency recorded in `ctx` by the [`Timed`] hooks, or zero.
pub fn latency(ctx: &Context) -> Duration {
    ctx.value::<RequestTimer>()
        .map(RequestTimer::elapsed)
        .unwrap_or_default()
}

/// Decorator that measures latency around another hook.
///
/// Install the same `Timed` as both the before- and the after-hook: the
/// before side stores a start time in the context and runs the inner hook,
/// the after side runs the inner hook and then records the elapsed time.
///
/// ```rust
/// use fletch_client::{HttpClientConfig, PassThrough, StatusCheck, Timed};
///
/// let config = HttpClientConfig::builder()
///     .before(Timed::new(PassThrough))
///     .after(Timed::new(StatusCheck::success()))
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Timed<H> {
    inner: H,
}

impl<H> Timed<H> {
    /// Wrap `inner`.
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: BeforeHook> BeforeHook for Timed<H> {
    async fn before(&self, ctx: Context, request: &mut Request) -> Result<Context> {
        let ctx = ctx.with_value(RequestTimer::start());
        self.inner.before(ctx, request).await
    }
}

#[async_trait]
impl<H: AfterHook> AfterHook for Timed<H> {
    async fn after(&self, ctx: Context, response: &mut RawResponse) -> Result<Context> {
        let timer = ctx.value::<RequestTimer>().cloned();
        let result = self.inner.after(ctx, response).await;
        if let Some(timer) = timer {
            timer.stop();
        }
        result
    }
}

/// Request id assigned by the [`RequestId`] hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdValue(pub String);

/// Before-hook that adds a unique id header to each request and stores the
/// id in the context.
#[derive(Debug, Clone)]
pub struct RequestId {
    header_name: HeaderName,
    counter: Arc<AtomicU64>,
}

impl RequestId {
    /// Use the `X-Request-ID` header.
    pub fn new() -> Self {
        Self {
            header_name: HeaderName::from_static("x-request-id"),
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Use a custom header name.
    pub fn with_header(header: impl AsRef<str>) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header.as_ref().as_bytes())
            .map_err(|e| HttpClientError::InvalidHeader(e.to_string()))?;
        Ok(Self {
            header_name,
            counter: Arc::new(AtomicU64::new(0)),
        })
    }

    fn next_id(&self) -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{nanos:x}-{seq:x}")
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BeforeHook for RequestId {
    async fn before(&self, ctx: Context, request: &mut Request) -> Result<Context> {
        let id = self.next_id();
        let value =
            HeaderValue::from_str(&id).map_err(|e| HttpClientError::InvalidHeader(e.to_string()))?;
        request.headers_mut().insert(self.header_name.clone(), value);
        Ok(ctx.with_value(RequestIdValue(id)))
    }
}

/// Hook that logs requests and responses through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct Logging {
    log_headers: bool,
}

impl Logging {
    /// Create a new logging hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable logging of headers.
    pub fn with_headers(mut self) -> Self {
        self.log_headers = true;
        self
    }
}

#[async_trait]
impl BeforeHook for Logging {
    async fn before(&self, ctx: Context, request: &mut Request) -> Result<Context> {
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            "Sending HTTP request"
        );

        if self.log_headers {
            for (name, value) in request.headers() {
                tracing::trace!(header = %name, value = ?value, "Request header");
            }
        }

        Ok(ctx)
    }
}

#[async_trait]
impl AfterHook for Logging {
    async fn after(&self, ctx: Context, response: &mut RawResponse) -> Result<Context> {
        tracing::debug!(status = %response.status(), "Received HTTP response");

        if self.log_headers {
            for (name, value) in response.headers() {
                tracing::trace!(header = %name, value = ?value, "Response header");
            }
        }

        Ok(ctx)
    }
}
