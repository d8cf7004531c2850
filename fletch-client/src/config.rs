//! HTTP client configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::hook::{AfterHook, BeforeHook, SharedAfterHook, SharedBeforeHook};

/// HTTP client configuration.
#[derive(Clone)]
pub struct HttpClientConfig {
    /// Base URL that relative request URLs are joined onto.
    pub base_url: Option<String>,
    /// Default transport timeout for a whole request.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Proxy URL for all requests.
    pub proxy: Option<String>,
    /// How long an idle pooled connection is kept.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// Default headers for all requests.
    pub default_headers: Vec<(String, String)>,
    /// User agent string.
    pub user_agent: String,
    /// Enable gzip decompression.
    pub gzip: bool,
    /// Enable brotli decompression.
    pub brotli: bool,
    /// Follow redirects.
    pub follow_redirects: bool,
    /// Maximum redirects to follow.
    pub max_redirects: usize,
    /// Before-hook for requests that do not set their own.
    pub before: Option<SharedBeforeHook>,
    /// After-hook for requests that do not set their own.
    pub after: Option<SharedAfterHook>,
    /// Buffer every response body before the after-hook runs.
    pub reuse_body: bool,
    /// Log every request as a curl command.
    pub debug: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            proxy: None,
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            default_headers: Vec::new(),
            user_agent: format!("fletch/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
            brotli: true,
            follow_redirects: true,
            max_redirects: 10,
            before: None,
            after: None,
            reuse_body: false,
            debug: false,
        }
    }
}

impl fmt::Debug for HttpClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("proxy", &self.proxy)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("default_headers", &self.default_headers)
            .field("user_agent", &self.user_agent)
            .field("gzip", &self.gzip)
            .field("brotli", &self.brotli)
            .field("follow_redirects", &self.follow_redirects)
            .field("max_redirects", &self.max_redirects)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("reuse_body", &self.reuse_body)
            .field("debug", &self.debug)
            .finish()
    }
}

impl HttpClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client configuration.
#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL for all requests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the default request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Route all requests through a proxy.
    ///
    /// An invalid proxy URL does not fail here; every request sent by the
    /// client returns [`HttpClientError::InvalidProxy`](crate::HttpClientError::InvalidProxy).
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.config.proxy = Some(url.into());
        self
    }

    /// Set the connection pool idle timeout.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set the maximum idle connections per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Add a default header for all requests.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enable or disable gzip decompression.
    pub fn gzip(mut self, enable: bool) -> Self {
        self.config.gzip = enable;
        self
    }

    /// Enable or disable brotli decompression.
    pub fn brotli(mut self, enable: bool) -> Self {
        self.config.brotli = enable;
        self
    }

    /// Enable or disable following redirects.
    pub fn follow_redirects(mut self, enable: bool) -> Self {
        self.config.follow_redirects = enable;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Set the client-wide before-hook. Replaces any previous one.
    pub fn before(mut self, hook: impl BeforeHook + 'static) -> Self {
        self.config.before = Some(Arc::new(hook));
        self
    }

    /// Set the client-wide after-hook. Replaces any previous one.
    pub fn after(mut self, hook: impl AfterHook + 'static) -> Self {
        self.config.after = Some(Arc::new(hook));
        self
    }

    /// Buffer response bodies so after-hooks and callers can read them
    /// more than once.
    pub fn reuse_body(mut self, enable: bool) -> Self {
        self.config.reuse_body = enable;
        self
    }

    /// Log every request as a curl command.
    pub fn debug(mut self, enable: bool) -> Self {
        self.config.debug = enable;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}
