//! Fixed-delay request throttling.
//!
//! Wraps any [`Fetcher`] so that [`Fetcher::pace`] waits the same fixed
//! delay (`rate_limit_delay` seconds) before every request. There is no token
//! bucket and no adaptation to server responses; a zero delay disables the
//! wait. `fetch` itself never sleeps, callers pace first.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use gleaner_core::throttle::ThrottledFetcher;
//!
//! # use gleaner_core::traits::Fetcher;
//! # use gleaner_core::models::FetchedPage;
//! # struct MyFetcher;
//! # impl Fetcher for MyFetcher {
//! #     async fn fetch(&self, _: &str) -> Result<FetchedPage, gleaner_core::error::AppError> { todo!() }
//! # }
//! let fetcher = ThrottledFetcher::new(MyFetcher, Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::error::AppError;
use crate::models::FetchedPage;
use crate::traits::Fetcher;

/// A [`Fetcher`] wrapper whose pacing sleeps for a fixed delay.
#[derive(Debug, Clone)]
pub struct ThrottledFetcher<F> {
    inner: F,
    delay: Duration,
}

impl<F: Fetcher> ThrottledFetcher<F> {
    pub fn new(inner: F, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<F: Fetcher> Fetcher for ThrottledFetcher<F> {
    async fn pace(&self) {
        if !self.delay.is_zero() {
            tracing::debug!(sleep_ms = %self.delay.as_millis(), "Throttling request");
            tokio::time::sleep(self.delay).await;
        }
        self.inner.pace().await;
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        self.inner.fetch(url).await
    }
}
