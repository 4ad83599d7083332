pub mod database;
pub mod export;
pub mod preview;
pub mod repository;
pub mod writer;

pub use database::Database;
pub use preview::{describe_output, summarize_output};
pub use repository::ScrapedDataRepository;
pub use writer::FileWriter;
