//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{FetchedPage, Record};
use crate::status::StatusSink;
use crate::traits::{Authenticator, Extractor, Fetcher, LoginOutcome, RecordWriter};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher serving canned bodies per URL.
///
/// Unknown URLs get a default HTML page. Every requested URL is recorded.
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<Mutex<HashMap<String, Result<String, String>>>>,
    pub requested: Arc<Mutex<Vec<String>>>,
    pacing_log: Option<RecordingSink>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(html.to_string()));
        self
    }

    /// Requests for `url` fail with a `NetworkError`.
    pub fn with_failure(self, url: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(message.to_string()));
        self
    }

    /// Every `pace()` call appends `"paced"` to `log`.
    pub fn with_pacing_log(mut self, log: &RecordingSink) -> Self {
        self.pacing_log = Some(log.clone());
        self
    }
}

impl Fetcher for MockFetcher {
    async fn pace(&self) {
        if let Some(log) = &self.pacing_log {
            log.report("paced");
        }
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.responses.lock().unwrap().get(url) {
            Some(Ok(html)) => Ok(FetchedPage::new(url, 200, html.clone())),
            Some(Err(msg)) => Err(AppError::NetworkError(msg.clone())),
            None => Ok(FetchedPage::new(url, 200, "<html><body>default</body></html>")),
        }
    }
}

// ---------------------------------------------------------------------------
// MockAuthenticator
// ---------------------------------------------------------------------------

/// Mock authenticator with a fixed outcome.
#[derive(Clone)]
pub struct MockAuthenticator {
    result: Result<LoginOutcome, String>,
    pub calls: Arc<Mutex<usize>>,
}

impl MockAuthenticator {
    pub fn not_required() -> Self {
        Self {
            result: Ok(LoginOutcome::NotRequired),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Login fails with a `LoginError` carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: Arc::new(Mutex::new(0)),
        }
    }
}

impl Authenticator for MockAuthenticator {
    async fn login(&self) -> Result<LoginOutcome, AppError> {
        *self.calls.lock().unwrap() += 1;
        self.result.clone().map_err(AppError::LoginError)
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor producing `{url, body}` records, with per-URL failures.
#[derive(Clone, Default)]
pub struct MockExtractor {
    scrape_errors: Arc<Mutex<HashMap<String, String>>>,
    selector_errors: Arc<Mutex<HashMap<String, String>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extraction of `url` fails with a `ScrapeError`.
    pub fn with_scrape_error(self, url: &str, message: &str) -> Self {
        self.scrape_errors
            .lock()
            .unwrap()
            .insert(url.to_string(), message.to_string());
        self
    }

    /// Extraction of `url` fails with a `SelectorError`.
    pub fn with_selector_error(self, url: &str, selector: &str) -> Self {
        self.selector_errors
            .lock()
            .unwrap()
            .insert(url.to_string(), selector.to_string());
        self
    }
}

impl Extractor for MockExtractor {
    fn extract(&self, page: &FetchedPage) -> Result<Record, AppError> {
        if let Some(msg) = self.scrape_errors.lock().unwrap().get(&page.url) {
            return Err(AppError::ScrapeError(msg.clone()));
        }
        if let Some(selector) = self.selector_errors.lock().unwrap().get(&page.url) {
            return Err(AppError::SelectorError {
                selector: selector.clone(),
                message: "unexpected token".into(),
            });
        }
        let mut record = Record::new(&page.url);
        record.insert("body", page.body.clone());
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// MockWriter
// ---------------------------------------------------------------------------

/// Mock writer that records every saved batch.
#[derive(Clone, Default)]
pub struct MockWriter {
    pub saved: Arc<Mutex<Vec<Vec<Record>>>>,
    error: Arc<Mutex<Option<AppError>>>,
}

impl MockWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer that returns an error on save.
    pub fn with_error(error: AppError) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            error: Arc::new(Mutex::new(Some(error))),
        }
    }
}

impl RecordWriter for MockWriter {
    async fn save(&self, records: &[Record]) -> Result<PathBuf, AppError> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        if records.is_empty() {
            return Err(AppError::ScraperError(
                "No data was scraped; nothing to save.".into(),
            ));
        }
        self.saved.lock().unwrap().push(records.to_vec());
        Ok(PathBuf::from("/tmp/gleaner-test/out.json"))
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Sink that keeps every message for later assertions.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// True if any message contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.messages.lock().unwrap().iter().any(|m| m.contains(needle))
    }
}

impl StatusSink for RecordingSink {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
