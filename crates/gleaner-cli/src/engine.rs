use std::path::Path;
use std::sync::Arc;

use gleaner_client::{FormAuthenticator, HtmlExtractor, Session, SessionFetcher};
use gleaner_core::config::ScraperConfig;
use gleaner_core::error::AppError;
use gleaner_core::scrape::ScrapeService;
use gleaner_core::status::StatusSink;
use gleaner_core::throttle::ThrottledFetcher;
use gleaner_store::FileWriter;

/// A fully wired scraping run.
pub type Engine =
    ScrapeService<ThrottledFetcher<SessionFetcher>, FormAuthenticator, HtmlExtractor, FileWriter>;

/// Load the configuration at `config_path` and wire every component of a
/// run around one [`Session`].
///
/// Configuration problems (unreadable file, bad header values, missing
/// parsed-mode selectors) fail here, before any request is made.
pub fn build_engine(config_path: &Path, sink: Arc<dyn StatusSink>) -> Result<Engine, AppError> {
    sink.report(&format!(
        "Loading configuration from {}...",
        config_path.display()
    ));
    let config = ScraperConfig::load(config_path)?;

    let session = Session::from_config(&config, &*sink)?;

    let (mode, unknown) = config.resolve_capture_mode();
    if let Some(raw) = unknown {
        tracing::warn!(capture_mode = %raw, "Unknown capture mode");
        sink.report(&format!(
            "Unknown capture_mode '{raw}', defaulting to 'parsed'."
        ));
    }
    let extractor = HtmlExtractor::new(mode, &config)?;

    let fetcher = ThrottledFetcher::new(SessionFetcher::new(&session), config.request_delay());
    let authenticator = FormAuthenticator::from_config(session, &config, Arc::clone(&sink));
    let writer = FileWriter::from_config(&config);

    tracing::debug!(
        urls = config.urls().len(),
        mode = %mode,
        delay_secs = config.rate_limit_delay,
        "Engine built"
    );

    Ok(ScrapeService::new(config.urls(), fetcher, authenticator, extractor, writer).with_sink(sink))
}
