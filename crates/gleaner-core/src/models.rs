use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known record field names.
pub mod fields {
    pub const URL: &str = "url";
    pub const QUESTION: &str = "question";
    pub const ANSWERS: &str = "answers";
    pub const EXPLANATION: &str = "explanation";
    pub const STATUS_CODE: &str = "status_code";
    pub const RETRIEVED_AT: &str = "retrieved_at";
    pub const RAW_HTML: &str = "raw_html";
    pub const RAW_TEXT: &str = "raw_text";
    pub const TABLES: &str = "tables";
    pub const IMAGES: &str = "images";
}

/// One extracted page: field name to value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Start a record for `url`.
    pub fn new(url: &str) -> Self {
        let mut map = Map::new();
        map.insert(fields::URL.to_string(), Value::String(url.to_string()));
        Self(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn url(&self) -> Option<&str> {
        self.0.get(fields::URL).and_then(Value::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A successfully fetched page, before extraction.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status_code: u16,
    pub body: String,
    pub retrieved_at: DateTime<Utc>,
}

impl FetchedPage {
    pub fn new(url: &str, status_code: u16, body: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            status_code,
            body: body.into(),
            retrieved_at: Utc::now(),
        }
    }

    /// ISO-8601 UTC timestamp with a trailing `Z`, microsecond precision.
    pub fn retrieved_at_iso(&self) -> String {
        self.retrieved_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Why a page produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Transport failure or non-success status.
    Network(String),
    /// A required selector matched nothing.
    Parse(String),
    /// Anything else that went wrong while extracting.
    Unexpected(String),
}

impl SkipReason {
    /// Short category name used in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::Network(_) => "network",
            SkipReason::Parse(_) => "parse",
            SkipReason::Unexpected(_) => "unexpected",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Network(msg) | SkipReason::Parse(msg) | SkipReason::Unexpected(msg) => {
                f.write_str(msg)
            }
        }
    }
}

/// Result of scraping a single URL.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Scraped(Record),
    Skipped { url: String, reason: SkipReason },
}
