use std::path::PathBuf;

use gleaner_core::config::{OutputFormat, ScraperConfig};
use gleaner_core::error::AppError;
use gleaner_core::models::Record;
use gleaner_core::schema::field_union;
use gleaner_core::traits::RecordWriter;

use crate::database::Database;
use crate::export::{write_csv, write_json};

/// [`RecordWriter`] that writes the format named by `output_format` to
/// `output_filename`, resolved against the configuration file's directory.
///
/// Both settings are read at save time, so a bad value only surfaces once
/// there is something to save.
#[derive(Debug, Clone)]
pub struct FileWriter {
    config: ScraperConfig,
}

impl FileWriter {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl RecordWriter for FileWriter {
    async fn save(&self, records: &[Record]) -> Result<PathBuf, AppError> {
        if records.is_empty() {
            return Err(AppError::ScraperError(
                "No data was scraped; nothing to save.".into(),
            ));
        }

        let path = self.config.output_path()?;
        let format = self.config.output_format()?;

        match format {
            OutputFormat::Csv => {
                let schema = field_union(records);
                write_csv(&path, &schema, records)?;
            }
            OutputFormat::Json => write_json(&path, records)?,
            OutputFormat::Sqlite => {
                let schema = field_union(records);
                let db = Database::open(&path).await?;
                let repo = db.scraped_data();
                repo.ensure_table(&schema).await?;
                repo.insert_all(&schema, records).await?;
                db.close().await;
            }
        }

        tracing::info!(
            path = %path.display(),
            format = %format,
            records = records.len(),
            "Output written"
        );
        Ok(path)
    }
}
