use std::sync::Arc;

use gleaner_core::config::ScraperConfig;
use gleaner_core::error::AppError;
use gleaner_core::status::StatusSink;
use gleaner_core::traits::{Authenticator, LoginOutcome};
use reqwest::header::CONTENT_TYPE;
use url::form_urlencoded;

use crate::session::{LOGIN_TIMEOUT, Session};

/// Form-POST login over the run's session.
///
/// Session cookies from the configuration take precedence: when any of them
/// has a value, the login form is never submitted. A successful POST is
/// only checked at the HTTP level; whether the site actually accepted the
/// credentials is not verified.
pub struct FormAuthenticator {
    session: Session,
    login_required: bool,
    has_session_cookie: bool,
    login_url: Option<String>,
    username_field: Option<String>,
    password_field: Option<String>,
    username: Option<String>,
    password: Option<String>,
    sink: Arc<dyn StatusSink>,
}

impl FormAuthenticator {
    pub fn from_config(
        session: Session,
        config: &ScraperConfig,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            session,
            login_required: config.login_required,
            has_session_cookie: config.has_session_cookie(),
            login_url: config.login_url.clone(),
            username_field: config.login_username_field.clone(),
            password_field: config.login_password_field.clone(),
            username: config.username().map(str::to_string),
            password: config.password().map(str::to_string),
            sink,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Authenticator for FormAuthenticator {
    async fn login(&self) -> Result<LoginOutcome, AppError> {
        if self.has_session_cookie {
            self.sink.report(
                "Session cookies provided; skipping login and reusing the existing session.",
            );
            return Ok(LoginOutcome::SessionCookiesPresent);
        }

        if !self.login_required {
            self.sink.report("Login not required; skipping authentication.");
            return Ok(LoginOutcome::NotRequired);
        }

        let (
            Some(login_url),
            Some(username_field),
            Some(password_field),
            Some(username),
            Some(password),
        ) = (
            non_empty(&self.login_url),
            non_empty(&self.username_field),
            non_empty(&self.password_field),
            non_empty(&self.username),
            non_empty(&self.password),
        )
        else {
            return Err(AppError::LoginError(
                "Login configuration is incomplete. Please update config.json with the correct values."
                    .into(),
            ));
        };

        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair(username_field, username)
            .append_pair(password_field, password)
            .finish();

        self.sink.report("Submitting login form...");
        tracing::info!(%login_url, "Submitting login form");

        let response = self
            .session
            .client()
            .post(login_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .timeout(LOGIN_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::LoginRequestFailed {
                source: Box::new(e),
            })?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(AppError::LoginError(format!(
                "Login request failed: HTTP {} for {login_url}",
                status.as_u16()
            )));
        }

        self.sink.report("Login completed (verification pending website-specific checks).");
        Ok(LoginOutcome::Submitted)
    }
}
