use std::time::Duration;

use gleaner_core::error::AppError;
use gleaner_core::models::FetchedPage;
use gleaner_core::traits::Fetcher;
use reqwest::Client;

use crate::session::{FETCH_TIMEOUT, Session};

/// Page GETs over the run's [`Session`].
///
/// Shares headers and cookies with the authenticator, so a login performed
/// earlier in the run is visible to every fetch. Any non-2xx answer fails
/// the page.
#[derive(Clone)]
pub struct SessionFetcher {
    client: Client,
    timeout: Duration,
}

impl SessionFetcher {
    pub fn new(session: &Session) -> Self {
        Self::with_timeout(session, FETCH_TIMEOUT)
    }

    pub fn with_timeout(session: &Session, timeout: Duration) -> Self {
        Self {
            client: session.client().clone(),
            timeout,
        }
    }
}

impl Fetcher for SessionFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout.as_secs())
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {e}"))
                } else {
                    AppError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;

        Ok(FetchedPage::new(url, status.as_u16(), body))
    }
}
