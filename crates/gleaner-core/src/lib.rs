pub mod config;
pub mod error;
pub mod models;
pub mod schema;
pub mod scrape;
pub mod status;
pub mod throttle;
pub mod traits;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{CaptureMode, OutputFormat, ScraperConfig, SelectorList};
pub use error::AppError;
pub use models::{FetchedPage, PageOutcome, Record, SkipReason};
pub use scrape::ScrapeService;
pub use status::{ChannelSink, NullSink, StatusSink, TracingSink};
pub use traits::{Authenticator, Extractor, Fetcher, LoginOutcome, RecordWriter};
pub use worker::{RunHandle, spawn_worker};
