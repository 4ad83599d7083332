//! Field-union schema for tabular output.
//!
//! Records in one result set can carry different fields (raw vs parsed
//! pages, optional `raw_text`, tables only where configured). Tabular
//! backends need one column list, so every record is projected onto the
//! union of all field names.

use serde_json::Value;

use crate::models::{Record, fields};

/// Union of field names across `records`, in first-seen order, with
/// `tables` and `images` always present at the end if no record had them.
pub fn field_union(records: &[Record]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
    }
    for forced in [fields::TABLES, fields::IMAGES] {
        if !names.iter().any(|n| n == forced) {
            names.push(forced.to_string());
        }
    }
    names
}

/// Render a field value as a single text cell.
///
/// Missing and null values yield `None`; lists and objects become compact
/// JSON; scalars become their plain text.
pub fn cell_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Project `record` onto `schema`, one cell per column.
pub fn project(record: &Record, schema: &[String]) -> Vec<Option<String>> {
    schema
        .iter()
        .map(|name| cell_text(record.get(name)))
        .collect()
}
