use std::thread::JoinHandle;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::Record;
use crate::scrape::ScrapeService;
use crate::traits::{Authenticator, Extractor, Fetcher, RecordWriter};

/// Name given to the OS thread a run executes on.
pub const WORKER_THREAD_NAME: &str = "scraper-worker";

/// Handle to a run executing on its dedicated worker thread.
pub struct RunHandle {
    run_id: Uuid,
    handle: JoinHandle<Result<Vec<Record>, AppError>>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Block until the run completes and return its result.
    pub fn join(self) -> Result<Vec<Record>, AppError> {
        let run_id = self.run_id;
        self.handle.join().unwrap_or_else(|_| {
            Err(AppError::ScraperError(format!(
                "Scraper worker for run {run_id} panicked"
            )))
        })
    }
}

/// Start `service.run()` on a fresh OS thread with its own single-threaded
/// tokio runtime.
///
/// The caller's thread stays free; status messages reach it only through the
/// service's sink. The service is moved onto the worker and dropped there when
/// the run ends, which also closes any channel-backed sink.
pub fn spawn_worker<F, A, E, W>(service: ScrapeService<F, A, E, W>) -> Result<RunHandle, AppError>
where
    F: Fetcher + 'static,
    A: Authenticator + 'static,
    E: Extractor + 'static,
    W: RecordWriter + 'static,
{
    let run_id = Uuid::new_v4();
    let handle = std::thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || -> Result<Vec<Record>, AppError> {
            let span = tracing::info_span!("run", %run_id);
            let _entered = span.enter();

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            tracing::info!("Worker started");
            let result = runtime.block_on(service.run());
            match &result {
                Ok(records) => tracing::info!(records = records.len(), "Worker finished"),
                Err(e) => tracing::warn!(error = %e, "Worker finished with error"),
            }
            result
        })?;

    Ok(RunHandle { run_id, handle })
}
