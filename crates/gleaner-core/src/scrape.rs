use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{PageOutcome, Record, SkipReason};
use crate::status::{StatusSink, TracingSink};
use crate::traits::{Authenticator, Extractor, Fetcher, LoginOutcome, RecordWriter};

/// Orchestrates one scraping run: login → (fetch → extract)* → save.
///
/// Generic over all external dependencies via traits, enabling dependency injection
/// and testability without real HTTP or files. URLs are processed strictly in
/// configured order, one at a time; a failing page is reported and left out of
/// the result set, only login and persistence failures abort the run.
pub struct ScrapeService<F, A, E, W>
where
    F: Fetcher,
    A: Authenticator,
    E: Extractor,
    W: RecordWriter,
{
    fetcher: F,
    authenticator: A,
    extractor: E,
    writer: W,
    start_urls: Vec<String>,
    sink: Arc<dyn StatusSink>,
}

impl<F, A, E, W> ScrapeService<F, A, E, W>
where
    F: Fetcher,
    A: Authenticator,
    E: Extractor,
    W: RecordWriter,
{
    /// Create a service reporting status through `tracing`.
    pub fn new(
        start_urls: Vec<String>,
        fetcher: F,
        authenticator: A,
        extractor: E,
        writer: W,
    ) -> Self {
        Self {
            fetcher,
            authenticator,
            extractor,
            writer,
            start_urls,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the status sink.
    pub fn with_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = sink;
        self
    }

    fn report(&self, message: &str) {
        self.sink.report(message);
    }

    /// Run the login step. Call once per run.
    pub async fn login(&self) -> Result<LoginOutcome, AppError> {
        let outcome = self.authenticator.login().await?;
        tracing::debug!(?outcome, "Login step finished");
        Ok(outcome)
    }

    /// Fetch and extract a single page.
    ///
    /// The fetcher's pacing wait runs before the page is announced. Never
    /// fails: transport and extraction problems become
    /// [`PageOutcome::Skipped`] after being reported.
    pub async fn scrape_page(&self, url: &str) -> PageOutcome {
        self.fetcher.pace().await;
        self.report(&format!("Fetching {url}..."));

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(%url, error = %e, "Fetch failed");
                let message = format!("Network error while fetching {url}: {e}");
                self.report(&message);
                return PageOutcome::Skipped {
                    url: url.to_string(),
                    reason: SkipReason::Network(message),
                };
            }
        };
        tracing::debug!(%url, status = page.status_code, bytes = page.body.len(), "Fetched page");

        match self.extractor.extract(&page) {
            Ok(record) => {
                self.report(&format!("Successfully scraped {url}."));
                PageOutcome::Scraped(record)
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "Extraction failed");
                let (message, reason): (String, fn(String) -> SkipReason) = match &e {
                    AppError::ScrapeError(_) => {
                        (format!("Parsing error for {url}: {e}"), SkipReason::Parse)
                    }
                    _ => (
                        format!("Unexpected parsing error for {url}: {e}"),
                        SkipReason::Unexpected,
                    ),
                };
                self.report(&message);
                PageOutcome::Skipped {
                    url: url.to_string(),
                    reason: reason(message),
                }
            }
        }
    }

    /// Persist `records` through the configured writer.
    pub async fn save_data(&self, records: &[Record]) -> Result<PathBuf, AppError> {
        let path = self.writer.save(records).await?;
        tracing::info!(path = %path.display(), records = records.len(), "Results saved");
        self.report(&format!("Data saved to {}", path.display()));
        Ok(path)
    }

    /// Drive the whole pipeline and return the records that were saved.
    ///
    /// 1. Login (fatal on failure)
    /// 2. Scrape every configured URL in order, skipping failed pages
    /// 3. Return early with an empty result if nothing was scraped
    /// 4. Save the result set (fatal on failure)
    pub async fn run(&self) -> Result<Vec<Record>, AppError> {
        self.report("Starting scraping workflow...");

        if let Err(e) = self.login().await {
            tracing::error!(error = %e, "Login failed");
            self.report(&e.to_string());
            return Err(e);
        }

        let mut results = Vec::new();
        let mut skipped: BTreeMap<&'static str, usize> = BTreeMap::new();
        for url in &self.start_urls {
            if url.trim().is_empty() {
                continue;
            }
            match self.scrape_page(url).await {
                PageOutcome::Scraped(record) => results.push(record),
                PageOutcome::Skipped { reason, .. } => {
                    *skipped.entry(reason.kind()).or_default() += 1;
                }
            }
        }
        tracing::info!(
            attempted = self.start_urls.len(),
            scraped = results.len(),
            ?skipped,
            "Fetch phase complete"
        );

        if results.is_empty() {
            self.report("No successful scrapes were recorded.");
            return Ok(Vec::new());
        }

        if let Err(e) = self.save_data(&results).await {
            tracing::error!(error = %e, "Saving results failed");
            self.report(&e.to_string());
            return Err(e);
        }

        self.report("Scraping workflow completed.");
        Ok(results)
    }
}
