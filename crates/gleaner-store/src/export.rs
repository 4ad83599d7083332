//! Flat-file outputs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use gleaner_core::error::AppError;
use gleaner_core::models::Record;
use gleaner_core::schema::project;

/// Write `records` as CSV: a header row of `schema`, then one row per record.
/// Missing fields are empty cells; nested values are compact JSON text.
pub fn write_csv(path: &Path, schema: &[String], records: &[Record]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;

    writer.write_record(schema).map_err(csv_error)?;
    for record in records {
        let row = project(record, schema)
            .into_iter()
            .map(Option::unwrap_or_default);
        writer.write_record(row).map_err(csv_error)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write `records` unchanged as a pretty-printed JSON array.
pub fn write_json(path: &Path, records: &[Record]) -> Result<(), AppError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::CsvError(e.to_string())
}
