//! Scraper configuration loaded from a JSON file.
//!
//! Every recognised key is an explicit field with a documented default;
//! unknown keys are ignored. Scalars that users commonly write loosely
//! (`"true"`, `1`, `"2"`) are coerced the same way a dynamic config reader
//! would treat them.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::AppError;

/// Seconds to wait before each page request when `rate_limit_delay` is absent.
pub const DEFAULT_RATE_LIMIT_SECS: u64 = 1;

/// Login payload values (`credentials.username` / `credentials.password`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// One selector or an ordered list of selectors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SelectorList {
    One(String),
    Many(Vec<String>),
}

impl SelectorList {
    /// Selectors in configured order, blank entries dropped.
    pub fn selectors(&self) -> Vec<&str> {
        let all: Vec<&str> = match self {
            SelectorList::One(s) => vec![s.as_str()],
            SelectorList::Many(list) => list.iter().map(String::as_str).collect(),
        };
        all.into_iter().filter(|s| !s.trim().is_empty()).collect()
    }
}

/// Extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    /// Question / answers / explanation via selectors.
    #[default]
    Parsed,
    /// Verbatim page capture.
    Raw,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Parsed => "parsed",
            CaptureMode::Raw => "raw",
        }
    }

    /// Case-insensitive parse; `None` for unrecognised values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "parsed" => Some(CaptureMode::Parsed),
            "raw" => Some(CaptureMode::Raw),
            _ => None,
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    Sqlite,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        match lowered.as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "sqlite" => Ok(OutputFormat::Sqlite),
            _ => Err(AppError::ScraperError(format!(
                "Unsupported output format: {lowered}"
            ))),
        }
    }
}

/// Parsed configuration file. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub start_urls: Vec<Option<String>>,

    #[serde(deserialize_with = "truthy")]
    pub login_required: bool,
    pub login_url: Option<String>,
    pub login_username_field: Option<String>,
    pub login_password_field: Option<String>,
    pub credentials: Option<Credentials>,

    pub request_headers: Option<Map<String, Value>>,
    pub session_cookies: Option<Map<String, Value>>,

    #[serde(deserialize_with = "lenient_seconds")]
    pub rate_limit_delay: u64,

    #[serde(deserialize_with = "present_text")]
    pub capture_mode: Option<String>,
    pub question_selector: Option<String>,
    pub answer_selector: Option<String>,
    pub explanation_selector: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub raw_include_text: bool,

    pub table_selectors: Option<SelectorList>,
    pub image_selectors: Option<SelectorList>,

    #[serde(deserialize_with = "optional_text")]
    pub output_format: Option<String>,
    pub output_filename: Option<String>,

    /// Where the file was read from; output paths resolve against its directory.
    #[serde(skip)]
    source: PathBuf,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            start_urls: Vec::new(),
            login_required: false,
            login_url: None,
            login_username_field: None,
            login_password_field: None,
            credentials: None,
            request_headers: None,
            session_cookies: None,
            rate_limit_delay: DEFAULT_RATE_LIMIT_SECS,
            capture_mode: None,
            question_selector: None,
            answer_selector: None,
            explanation_selector: None,
            raw_include_text: true,
            table_selectors: None,
            image_selectors: None,
            output_format: None,
            output_filename: None,
            source: PathBuf::new(),
        }
    }
}

impl ScraperConfig {
    /// Read and parse the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )),
            _ => AppError::ConfigError(format!(
                "Failed to read configuration file {}: {e}",
                path.display()
            )),
        })?;

        let mut config = Self::from_json(&raw)?;
        config.source = path.to_path_buf();
        tracing::debug!(
            path = %path.display(),
            urls = config.start_urls.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parse configuration text. Relative output paths resolve against the
    /// current directory for configs built this way.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            AppError::ConfigError(format!("Failed to parse JSON configuration: {e}"))
        })?;
        if !value.is_object() {
            return Err(AppError::ConfigError(
                "Failed to parse JSON configuration: root must be an object".into(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| AppError::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Directory relative output paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        match self.source.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Fail with `ConfigError` when a required value is missing or empty.
    pub fn require<'a>(key: &str, value: Option<&'a str>) -> Result<&'a str, AppError> {
        match value {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(AppError::ConfigError(format!(
                "Missing required configuration value: {key}"
            ))),
        }
    }

    /// Configured URLs in order, null and blank entries dropped.
    pub fn urls(&self) -> Vec<String> {
        self.start_urls
            .iter()
            .flatten()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Fixed wait applied before every page request.
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.rate_limit_delay)
    }

    /// Resolve `capture_mode`. The second element carries the offending value
    /// when it was not recognised (the mode then falls back to `parsed`).
    pub fn resolve_capture_mode(&self) -> (CaptureMode, Option<String>) {
        match self.capture_mode.as_deref() {
            None => (CaptureMode::Parsed, None),
            Some(raw) => match CaptureMode::parse(raw) {
                Some(mode) => (mode, None),
                None => (CaptureMode::Parsed, Some(raw.to_lowercase())),
            },
        }
    }

    /// Header overrides as text pairs, null values skipped.
    pub fn header_overrides(&self) -> Vec<(String, String)> {
        text_pairs(self.request_headers.as_ref())
    }

    /// Cookie overrides as text pairs, null values skipped.
    pub fn cookie_overrides(&self) -> Vec<(String, String)> {
        text_pairs(self.session_cookies.as_ref())
    }

    /// True when at least one configured session cookie has a truthy value.
    pub fn has_session_cookie(&self) -> bool {
        self.session_cookies
            .as_ref()
            .is_some_and(|cookies| cookies.values().any(is_truthy))
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref()?.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.credentials.as_ref()?.password.as_deref()
    }

    /// Parsed `output_format`. Missing counts as unsupported.
    pub fn output_format(&self) -> Result<OutputFormat, AppError> {
        self.output_format.as_deref().unwrap_or_default().parse()
    }

    /// Absolute output path: `output_filename` joined onto [`base_dir`](Self::base_dir).
    pub fn output_path(&self) -> Result<PathBuf, AppError> {
        let filename = Self::require("output_filename", self.output_filename.as_deref())?;
        Ok(std::path::absolute(self.base_dir().join(filename))?)
    }
}

/// Replace `start_urls` in the config file at `path`, keeping every other key.
pub fn persist_start_urls(path: impl AsRef<Path>, urls: &[String]) -> Result<(), AppError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => {
            AppError::ConfigError(format!("Configuration file not found: {}", path.display()))
        }
        _ => AppError::IoError(e),
    })?;
    let mut value: Value = serde_json::from_str(&raw)
        .map_err(|e| AppError::ConfigError(format!("Invalid JSON in configuration file: {e}")))?;

    let Some(object) = value.as_object_mut() else {
        return Err(AppError::ConfigError(
            "Invalid JSON in configuration file: root must be an object".into(),
        ));
    };
    object.insert(
        "start_urls".into(),
        Value::Array(urls.iter().cloned().map(Value::String).collect()),
    );

    std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    Ok(())
}

/// Truthiness of a JSON value: null, false, 0, "" and empty containers are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn text_pairs(map: Option<&Map<String, Value>>) -> Vec<(String, String)> {
    let Some(map) = map else {
        return Vec::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), text)
        })
        .collect()
}

/// Text form of a scalar as written in the file. Null reads as `none`.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Any present value becomes text, including an explicit null.
fn present_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| Some(scalar_text(&v)))
}

/// Like [`present_text`], but null counts as absent.
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok((!value.is_null()).then(|| scalar_text(&value)))
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| is_truthy(&v))
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let secs: i64 = match &value {
        Value::Null => DEFAULT_RATE_LIMIT_SECS as i64,
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().map_err(|_| {
            D::Error::custom(format!("rate_limit_delay must be an integer, got '{s}'"))
        })?,
        other => {
            return Err(D::Error::custom(format!(
                "rate_limit_delay must be an integer, got {other}"
            )));
        }
    };
    Ok(secs.max(0) as u64)
}
