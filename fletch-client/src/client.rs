//! HTTP client implementation.

use std::sync::{Arc, LazyLock};

use http::Method;
use reqwest::Request;
use tracing::{debug, warn};

use crate::hook::{PassThrough, SharedAfterHook, SharedBeforeHook, StatusCheck};
use crate::{Context, HttpClientConfig, HttpClientError, RequestBuilder, Result};

/// Shared, connection-pooled HTTP client.
///
/// Cloning is cheap; clones share the connection pool. Construction never
/// fails: a configuration the transport rejects (an invalid proxy, say) is
/// recorded and returned by every request sent through the client.
#[derive(Clone)]
pub struct HttpClient {
    transport: std::result::Result<reqwest::Client, HttpClientError>,
    config: Arc<HttpClientConfig>,
    before: SharedBeforeHook,
    after: SharedAfterHook,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Self {
        let transport = build_transport(&config);
        if let Err(e) = &transport {
            warn!(error = %e, "HTTP client configuration rejected");
        }

        let before = config
            .before
            .clone()
            .unwrap_or_else(|| Arc::new(PassThrough));
        let after = config
            .after
            .clone()
            .unwrap_or_else(|| Arc::new(PassThrough));

        Self {
            transport,
            config: Arc::new(config),
            before,
            after,
        }
    }

    /// Get the underlying reqwest client, if it could be built.
    pub fn inner(&self) -> Option<&reqwest::Client> {
        self.transport.as_ref().ok()
    }

    /// Get the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// The error recorded while building the client, if any.
    pub fn init_error(&self) -> Option<&HttpClientError> {
        self.transport.as_ref().err()
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Ok(Method::GET), url.into())
    }

    /// Create a POST request builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Ok(Method::POST), url.into())
    }

    /// Create a PUT request builder.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Ok(Method::PUT), url.into())
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Ok(Method::PATCH), url.into())
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Ok(Method::DELETE), url.into())
    }

    /// Create a HEAD request builder.
    pub fn head(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Ok(Method::HEAD), url.into())
    }

    /// Create an OPTIONS request builder.
    pub fn options(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Ok(Method::OPTIONS), url.into())
    }

    /// Create a request builder with a custom method.
    ///
    /// The method name is upper-cased, so `"get"` and `"GET"` are the same.
    pub fn request(&self, method: impl AsRef<str>, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, parse_method(method.as_ref()), url.into())
    }

    pub(crate) fn before_hook(&self) -> SharedBeforeHook {
        Arc::clone(&self.before)
    }

    pub(crate) fn after_hook(&self) -> SharedAfterHook {
        Arc::clone(&self.after)
    }

    /// Dispatch a request, racing the context's cancellation and deadline.
    pub(crate) async fn execute(&self, ctx: &Context, request: Request) -> Result<reqwest::Response> {
        let transport = self.transport.as_ref().map_err(Clone::clone)?;

        debug!(
            method = %request.method(),
            url = %request.url(),
            "Sending HTTP request"
        );

        let response = ctx
            .run(async { transport.execute(request).await.map_err(HttpClientError::from) })
            .await?;

        debug!(status = %response.status(), "Received HTTP response");
        Ok(response)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(HttpClientConfig::default())
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("init_error", &self.init_error())
            .finish()
    }
}

fn build_transport(config: &HttpClientConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .gzip(config.gzip)
        .brotli(config.brotli);

    if config.follow_redirects {
        builder = builder.redirect(reqwest::redirect::Policy::limited(config.max_redirects));
    } else {
        builder = builder.redirect(reqwest::redirect::Policy::none());
    }

    if let Some(proxy) = &config.proxy {
        let parsed = url::Url::parse(proxy)
            .map_err(|e| HttpClientError::InvalidProxy(format!("{proxy}: {e}")))?;
        let proxy = reqwest::Proxy::all(parsed)
            .map_err(|e| HttpClientError::InvalidProxy(e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| HttpClientError::ClientBuild(e.to_string()))
}

pub(crate) fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| HttpClientError::InvalidMethod(method.to_string()))
}

static DEFAULT_CLIENT: LazyLock<HttpClient> = LazyLock::new(|| {
    HttpClient::new(
        HttpClientConfig::builder()
            .after(StatusCheck::success())
            .build(),
    )
});

/// The process-wide client behind the free request functions.
///
/// It uses the default configuration plus a [`StatusCheck::success`]
/// after-hook, so non-2xx responses come back with an error recorded.
pub fn default_client() -> &'static HttpClient {
    &DEFAULT_CLIENT
}

/// GET `url` with the default client.
pub fn get(url: impl Into<String>) -> RequestBuilder<'static> {
    default_client().get(url)
}

/// POST to `url` with the default client.
pub fn post(url: impl Into<String>) -> RequestBuilder<'static> {
    default_client().post(url)
}

/// PUT to `url` with the default client.
pub fn put(url: impl Into<String>) -> RequestBuilder<'static> {
    default_client().put(url)
}

/// PATCH `url` with the default client.
pub fn patch(url: impl Into<String>) -> RequestBuilder<'static> {
    default_client().patch(url)
}

/// DELETE `url` with the default client.
pub fn delete(url: impl Into<String>) -> RequestBuilder<'static> {
    default_client().delete(url)
}

/// HEAD `url` with the default client.
pub fn head(url: impl Into<String>) -> RequestBuilder<'static> {
    default_client().head(url)
}

/// OPTIONS `url` with the default client.
pub fn options(url: impl Into<String>) -> RequestBuilder<'static> {
    default_client().options(url)
}

/// Request `url` with a custom method on the default client.
pub fn request(method: impl AsRef<str>, url: impl Into<String>) -> RequestBuilder<'static> {
    default_client().request(method, url)
}
