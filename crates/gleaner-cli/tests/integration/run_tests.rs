use std::sync::Arc;

use gleaner_cli::build_engine;
use gleaner_core::error::AppError;
use gleaner_core::status::ChannelSink;
use gleaner_core::worker::spawn_worker;
use serde_json::{Value, json};

use crate::integration::common::{Recorder, parsed_config, qa_page, raw_config, write_config};

#[tokio::test]
async fn parsed_run_skips_page_without_answers() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/a")
        .with_body(qa_page("Q?", &["A1", "A2"], "Because."))
        .create_async()
        .await;
    server
        .mock("GET", "/b")
        .with_body(r#"<h1 class="q">Q2</h1><p class="e">E2</p>"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let url_a = format!("{}/a", server.url());
    let url_b = format!("{}/b", server.url());
    let config = write_config(
        dir.path(),
        &parsed_config(json!({"start_urls": [url_a, url_b]})),
    );

    let recorder = Recorder::default();
    let engine = build_engine(&config, recorder.sink()).unwrap();
    let records = engine.run().await.unwrap();

    assert_eq!(records.len(), 1);
    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("out.json")).unwrap())
            .unwrap();
    assert_eq!(
        written,
        json!([{
            "url": url_a,
            "question": "Q?",
            "answers": ["A1", "A2"],
            "explanation": "Because."
        }])
    );
    assert!(recorder.saw(&format!("Parsing error for {url_b}")));
    assert!(recorder.saw("Data saved to"));
}

#[tokio::test]
async fn run_with_no_successes_writes_nothing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/b")
        .with_body("<p>nothing here</p>")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &parsed_config(json!({"start_urls": [format!("{}/b", server.url())]})),
    );

    let recorder = Recorder::default();
    let records = build_engine(&config, recorder.sink())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(records.is_empty());
    assert!(!dir.path().join("out.json").exists());
    assert!(recorder.saw("No successful scrapes were recorded."));
}

#[tokio::test]
async fn incomplete_login_aborts_before_any_fetch() {
    let mut server = mockito::Server::new_async().await;
    let page = server
        .mock("GET", "/a")
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &parsed_config(json!({
            "start_urls": [format!("{}/a", server.url())],
            "login_required": true,
            "login_url": format!("{}/login", server.url()),
            "login_username_field": "user",
            "login_password_field": "pass",
            "credentials": {"username": "alice"}
        })),
    );

    let err = build_engine(&config, Recorder::default().sink())
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::LoginError(_)));
    page.assert_async().await;
}

#[tokio::test]
async fn login_cookie_is_reused_for_page_fetches() {
    let mut server = mockito::Server::new_async().await;
    let login = server
        .mock("POST", "/login")
        .with_status(200)
        .with_header("set-cookie", "sid=fresh; Path=/")
        .create_async()
        .await;
    let page = server
        .mock("GET", "/a")
        .match_header("cookie", "sid=fresh")
        .with_body(qa_page("Q", &["A"], "E"))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &parsed_config(json!({
            "start_urls": [format!("{}/a", server.url())],
            "login_required": true,
            "login_url": format!("{}/login", server.url()),
            "login_username_field": "user",
            "login_password_field": "pass",
            "credentials": {"username": "alice", "password": "pw"}
        })),
    );

    let recorder = Recorder::default();
    let records = build_engine(&config, recorder.sink())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    login.assert_async().await;
    page.assert_async().await;
    assert!(recorder.saw("Login completed (verification pending website-specific checks)."));
}

#[tokio::test]
async fn configured_cookies_replace_login() {
    let mut server = mockito::Server::new_async().await;
    let login = server
        .mock("POST", "/login")
        .expect(0)
        .create_async()
        .await;
    let page = server
        .mock("GET", "/a")
        .match_header("cookie", "sid=abc")
        .with_body(qa_page("Q", &["A"], "E"))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &parsed_config(json!({
            "start_urls": [format!("{}/a", server.url())],
            "login_required": true,
            "login_url": format!("{}/login", server.url()),
            "session_cookies": {"sid": "abc"}
        })),
    );

    let recorder = Recorder::default();
    build_engine(&config, recorder.sink())
        .unwrap()
        .run()
        .await
        .unwrap();

    login.assert_async().await;
    page.assert_async().await;
    assert!(recorder.saw("Applied session cookies from configuration."));
}

#[tokio::test]
async fn http_error_skips_only_that_url() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/gone")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/ok")
        .with_body("<p>ok</p>")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let gone = format!("{}/gone", server.url());
    let ok = format!("{}/ok", server.url());
    let config = write_config(
        dir.path(),
        &raw_config(json!({"start_urls": [gone, null, "", ok]})),
    );

    let recorder = Recorder::default();
    let records = build_engine(&config, recorder.sink())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url(), Some(ok.as_str()));
    assert!(recorder.saw(&format!("Network error while fetching {gone}")));
}

#[tokio::test]
async fn invalid_table_selector_skips_pages_without_aborting() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/a")
        .with_body("<table><tr><td>1</td></tr></table>")
        .create_async()
        .await;
    let second = server
        .mock("GET", "/b")
        .with_body("<p>plain</p>")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let url_a = format!("{}/a", server.url());
    let url_b = format!("{}/b", server.url());
    let config = write_config(
        dir.path(),
        &raw_config(json!({
            "start_urls": [url_a, url_b],
            "table_selectors": ["table", "[[bad"]
        })),
    );

    let recorder = Recorder::default();
    let records = build_engine(&config, recorder.sink())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(records.is_empty());
    first.assert_async().await;
    second.assert_async().await;
    assert!(recorder.saw(&format!("Unexpected parsing error for {url_a}")));
    assert!(recorder.saw(&format!("Unexpected parsing error for {url_b}")));
    assert!(recorder.saw("No successful scrapes were recorded."));
    assert!(!dir.path().join("out.json").exists());
}

#[tokio::test]
async fn unknown_capture_mode_falls_back_to_parsed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/a")
        .with_body(qa_page("Q", &["A"], "E"))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &parsed_config(json!({
            "start_urls": [format!("{}/a", server.url())],
            "capture_mode": "Fancy"
        })),
    );

    let recorder = Recorder::default();
    let records = build_engine(&config, recorder.sink())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(recorder.saw("Unknown capture_mode 'fancy', defaulting to 'parsed'."));
    assert_eq!(records[0].get("question"), Some(&json!("Q")));
}

#[test]
fn missing_parsed_selector_fails_at_build() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = parsed_config(json!({"start_urls": ["http://127.0.0.1:9/"]}));
    config.as_object_mut().unwrap().remove("answer_selector");
    let path = write_config(dir.path(), &config);

    let err = build_engine(&path, Recorder::default().sink()).err().unwrap();

    assert!(matches!(err, AppError::ConfigError(_)));
    assert!(err.is_fatal());
    assert_eq!(
        err.to_string(),
        "Missing required configuration value: answer_selector"
    );
}

#[test]
fn missing_config_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();

    let err = build_engine(&dir.path().join("absent.json"), recorder.sink())
        .err()
        .unwrap();

    assert!(matches!(err, AppError::ConfigError(_)));
    assert!(err.to_string().starts_with("Configuration file not found"));
    assert!(recorder.messages()[0].starts_with("Loading configuration from"));
}

#[tokio::test]
async fn worker_streams_status_in_order() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/a")
        .with_body("<p>hello</p>")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let url = format!("{}/a", server.url());
    let config = write_config(dir.path(), &raw_config(json!({"start_urls": [url]})));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let engine = build_engine(&config, Arc::new(ChannelSink::new(tx))).unwrap();
    let handle = spawn_worker(engine).unwrap();

    let mut messages = Vec::new();
    while let Some(msg) = rx.recv().await {
        messages.push(msg);
    }
    let records = tokio::task::spawn_blocking(move || handle.join())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(records.len(), 1);
    let position = |needle: &str| messages.iter().position(|m| m.starts_with(needle)).unwrap();
    assert!(position("Loading configuration") < position("Starting scraping workflow"));
    assert!(position("Login not required") < position(&format!("Fetching {url}")));
    assert!(position(&format!("Successfully scraped {url}")) < position("Data saved to"));
    assert_eq!(messages.last().unwrap(), "Scraping workflow completed.");
}
