//! Request context.
//!
//! A [`Context`] travels with a request through the before-hook, the
//! dispatch and the after-hook, and ends up on the [`Response`](crate::Response).
//! It carries an optional cancellation token, an optional deadline and a
//! typed value map hooks use to pass data along (timers, request ids, ...).

use std::time::Duration;

use http::Extensions;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{HttpClientError, Result};

/// Cancellation, deadline and values for one request.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: Option<CancellationToken>,
    deadline: Option<Instant>,
    values: Extensions,
}

impl Context {
    /// A context that never cancels and carries no values.
    pub fn background() -> Self {
        Self::default()
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Set an absolute deadline. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Set a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Store a value, replacing any previous value of the same type.
    pub fn with_value<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.values.insert(value);
        self
    }

    /// Get a stored value.
    pub fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    /// The cancellation token, if any.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check if the context is already done.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
            || self.deadline.is_some_and(|d| d <= Instant::now())
    }

    /// The error a done context resolves to, if it is done.
    pub fn err(&self) -> Option<HttpClientError> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(HttpClientError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => {
                Some(HttpClientError::Timeout(Duration::ZERO))
            }
            _ => None,
        }
    }

    /// Run `fut` until it completes or the context is done.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => {
                    let started = Instant::now();
                    tokio::time::sleep_until(deadline).await;
                    started.elapsed()
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(HttpClientError::Cancelled),
            waited = expired => Err(HttpClientError::Timeout(waited)),
            result = fut => result,
        }
    }
}
