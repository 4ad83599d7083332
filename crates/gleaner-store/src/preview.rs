//! Short human-readable summaries of a written output file.

use std::path::Path;

use gleaner_core::config::{OutputFormat, ScraperConfig};
use gleaner_core::error::AppError;

use crate::database::Database;

/// Lines of a CSV file shown in a preview.
pub const PREVIEW_LINES: usize = 10;

/// Characters of pretty-printed JSON shown in a preview.
pub const PREVIEW_CHARS: usize = 2000;

/// Summary of the output file `path`, written in `format`.
pub async fn summarize_output(format: OutputFormat, path: &Path) -> Result<String, AppError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match format {
        OutputFormat::Csv => Ok(format!(
            "Scraping complete. Preview of {name}:\n{}",
            preview_lines(path, PREVIEW_LINES)?
        )),
        OutputFormat::Json => Ok(format!(
            "Scraping complete. Preview of {name}:\n{}",
            preview_json(path, PREVIEW_CHARS)?
        )),
        OutputFormat::Sqlite => {
            let db = Database::open(path).await?;
            let count = db.scraped_data().count().await;
            db.close().await;
            Ok(format!("Scraping complete. Stored {} rows in {name}.", count?))
        }
    }
}

/// Summary for the output a configuration points at. Never fails: problems
/// are described in the returned text.
pub async fn describe_output(config: &ScraperConfig) -> String {
    let path = match config.output_path() {
        Ok(path) => path,
        Err(_) => {
            return "Scraping complete. Output filename missing from config; unable to display summary."
                .into();
        }
    };
    if !path.exists() {
        return format!(
            "Scraping complete, but output file was not found at {}.",
            path.display()
        );
    }

    let Ok(format) = config.output_format() else {
        return format!("Scraping complete. Output file saved to {}.", path.display());
    };

    match summarize_output(format, &path).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to summarize output");
            format!("Scraping complete, but failed to read output file: {e}")
        }
    }
}

/// First `max_lines` lines of a text file, `...` appended when truncated.
pub fn preview_lines(path: &Path, max_lines: usize) -> Result<String, AppError> {
    let text = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return Ok("(file is empty)".into());
    }

    let mut shown: Vec<&str> = lines.iter().take(max_lines).copied().collect();
    if lines.len() > max_lines {
        shown.push("...");
    }
    Ok(shown.join("\n"))
}

/// JSON file re-pretty-printed, cut after `max_chars` characters.
pub fn preview_json(path: &Path, max_chars: usize) -> Result<String, AppError> {
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let pretty = serde_json::to_string_pretty(&value)?;
    if pretty.chars().count() <= max_chars {
        return Ok(pretty);
    }
    let cut: String = pretty.chars().take(max_chars).collect();
    Ok(format!("{cut}\n..."))
}
