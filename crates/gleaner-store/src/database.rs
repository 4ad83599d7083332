use std::path::Path;

use gleaner_core::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::repository::ScrapedDataRepository;

/// Handle on one SQLite output file.
///
/// The file is created on first connect. A single connection is enough:
/// every save runs inside one transaction.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to open {}: {e}", path.display()))
            })?;

        Ok(Self { pool })
    }

    /// Create a `Database` from an existing pool (useful for testing).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a [`ScrapedDataRepository`] backed by this pool.
    pub fn scraped_data(&self) -> ScrapedDataRepository {
        ScrapedDataRepository::new(self.pool.clone())
    }

    /// Wait for the connection to close so the file is fully released.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
