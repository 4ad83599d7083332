use std::sync::{Arc, RwLock};
use std::time::Duration;

use gleaner_core::config::ScraperConfig;
use gleaner_core::error::AppError;
use gleaner_core::status::StatusSink;
use reqwest::Client;
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

/// Browser-like identity sent unless `request_headers` sets its own `User-Agent`.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0 Safari/537.36";

/// Timeout for the login form POST.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for each page GET.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Cookie store for one run.
///
/// Configured cookies carry no domain, so they are sent to every host.
/// Cookies set by responses (e.g. the login reply) go through a regular
/// [`Jar`] and follow normal domain/path rules; on a name clash the
/// response cookie wins.
#[derive(Default)]
pub struct SessionCookies {
    seeded: RwLock<Vec<(String, String)>>,
    jar: Jar,
}

impl SessionCookies {
    /// Add a cookie sent with every request.
    pub fn seed(&self, name: &str, value: &str) {
        if let Ok(mut seeded) = self.seeded.write() {
            seeded.retain(|(n, _)| n != name);
            seeded.push((name.to_string(), value.to_string()));
        }
    }

    /// Names and values of the configured cookies.
    pub fn seeded(&self) -> Vec<(String, String)> {
        self.seeded.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.jar.set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let from_jar = self
            .jar
            .cookies(url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
            .unwrap_or_default();

        let jar_names: Vec<&str> = from_jar
            .split(';')
            .filter_map(|pair| pair.split('=').next())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();

        let mut pairs: Vec<String> = self
            .seeded()
            .into_iter()
            .filter(|(name, _)| !jar_names.contains(&name.as_str()))
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        if !from_jar.is_empty() {
            pairs.push(from_jar);
        }

        if pairs.is_empty() {
            return None;
        }
        HeaderValue::from_str(&pairs.join("; ")).ok()
    }
}

/// The run's HTTP session: default headers plus a shared cookie store.
///
/// Built once per run and handed to the authenticator and the fetcher;
/// clones share the same connection pool and cookies.
#[derive(Clone)]
pub struct Session {
    client: Client,
    headers: HeaderMap,
    cookies: Arc<SessionCookies>,
}

impl Session {
    /// Build the session from configuration, reporting which overrides applied.
    pub fn from_config(config: &ScraperConfig, sink: &dyn StatusSink) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        let overrides = config.header_overrides();
        if !overrides.is_empty() {
            for (name, value) in &overrides {
                let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    AppError::ConfigError(format!("Invalid request header name '{name}': {e}"))
                })?;
                let header_value = HeaderValue::from_str(value).map_err(|e| {
                    AppError::ConfigError(format!("Invalid value for request header '{name}': {e}"))
                })?;
                headers.insert(header_name, header_value);
            }
            tracing::debug!(count = overrides.len(), "Custom request headers applied");
            sink.report("Applied custom request headers from configuration.");
        }

        let cookies = Arc::new(SessionCookies::default());
        if config.session_cookies.as_ref().is_some_and(|c| !c.is_empty()) {
            for (name, value) in config.cookie_overrides() {
                HeaderValue::from_str(&format!("{name}={value}")).map_err(|e| {
                    AppError::ConfigError(format!("Invalid session cookie '{name}': {e}"))
                })?;
                cookies.seed(&name, &value);
            }
            sink.report("Applied session cookies from configuration.");
        }

        let client = Client::builder()
            .default_headers(headers.clone())
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(|e| AppError::HttpError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            headers,
            cookies,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }
}
