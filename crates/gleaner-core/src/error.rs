use thiserror::Error;

/// Application-wide error types for gleaner.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration file missing, unreadable, malformed, or missing a required key.
    #[error("{0}")]
    ConfigError(String),

    /// Login configuration incomplete or the login form was rejected.
    #[error("{0}")]
    LoginError(String),

    /// The login request never got a response.
    #[error("Login request failed: {source}")]
    LoginRequestFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A required selector did not match anything on a page.
    #[error("{0}")]
    ScrapeError(String),

    /// A selector string could not be parsed.
    #[error("Invalid selector '{selector}': {message}")]
    SelectorError { selector: String, message: String },

    /// Nothing to save, or the output format is not supported.
    #[error("{0}")]
    ScraperError(String),

    /// HTTP request failed (non-success status, client construction, body read).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// SQLite operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    /// Returns true if this error must abort the whole run.
    ///
    /// Page-level failures (selector misses, transport errors) only cost the
    /// page they happened on.
    pub fn is_fatal(&self) -> bool {
        !self.is_page_recoverable()
    }

    /// Returns true if the failure is confined to a single page.
    pub fn is_page_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::ScrapeError(_)
                | AppError::SelectorError { .. }
                | AppError::HttpError(_)
                | AppError::NetworkError(_)
                | AppError::Timeout(_)
        )
    }
}
