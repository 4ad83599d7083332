use std::future::Future;
use std::path::PathBuf;

use crate::error::AppError;
use crate::models::{FetchedPage, Record};

/// Fetches a page over the run's HTTP session.
pub trait Fetcher: Send + Sync {
    /// Wait until the next request may start. Runs before the request is
    /// announced; the default does not wait.
    fn pace(&self) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Any `Err` is page-local: the caller skips the URL and moves on.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, AppError>> + Send;
}

/// How a login step concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Configured session cookies are reused instead of logging in.
    SessionCookiesPresent,
    /// `login_required` is false or absent.
    NotRequired,
    /// The login form was submitted and accepted at the HTTP level.
    Submitted,
}

/// Optional login step, run once before any page is fetched.
pub trait Authenticator: Send + Sync {
    /// An `Err` here is fatal to the run.
    fn login(&self) -> impl Future<Output = Result<LoginOutcome, AppError>> + Send;
}

/// Turns a fetched page into a record.
pub trait Extractor: Send + Sync {
    /// `ScrapeError` when a required selector matched nothing; any error
    /// drops only this page.
    fn extract(&self, page: &FetchedPage) -> Result<Record, AppError>;
}

/// Persists a finished result set.
pub trait RecordWriter: Send + Sync {
    /// Write `records` and return the output path. Fails with `ScraperError`
    /// when `records` is empty.
    fn save(&self, records: &[Record]) -> impl Future<Output = Result<PathBuf, AppError>> + Send;
}
