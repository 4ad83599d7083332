use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use gleaner_cli::build_engine;
use gleaner_core::config::{ScraperConfig, persist_start_urls};
use gleaner_core::error::AppError;
use gleaner_core::status::ChannelSink;
use gleaner_core::worker::spawn_worker;
use gleaner_store::{describe_output, summarize_output};

#[derive(Parser)]
#[command(name = "gleaner", version, about = "Configuration-driven web scraper")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(
        short,
        long,
        env = "GLEANER_CONFIG",
        default_value = "config.json",
        global = true
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every configured URL and write the output file
    Run {
        /// Comma-separated URLs; replaces `start_urls` in the config file
        #[arg(short, long, value_delimiter = ',')]
        urls: Option<Vec<String>>,
    },

    /// Show a preview of the existing output file
    Preview,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("gleaner=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { urls } => cmd_run(&cli.config, urls).await,
        Commands::Preview => cmd_preview(&cli.config).await,
    }
}

async fn cmd_run(config_path: &Path, urls: Option<Vec<String>>) -> Result<ExitCode> {
    if let Some(raw) = urls {
        let urls: Vec<String> = raw
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect();
        if urls.is_empty() {
            println!("No URLs provided. Please enter at least one URL to scrape.");
            return Ok(ExitCode::FAILURE);
        }
        if let Err(e) = persist_start_urls(config_path, &urls) {
            match e {
                AppError::ConfigError(_) => println!("{e}"),
                _ => println!("Failed to update configuration: {e}"),
            }
            return Ok(ExitCode::FAILURE);
        }
        tracing::info!(count = urls.len(), "Start URLs updated");
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = match build_engine(config_path, Arc::new(ChannelSink::new(tx))) {
        Ok(engine) => engine,
        Err(e) => {
            // Messages queued before the failure are still shown.
            while let Ok(msg) = rx.try_recv() {
                println!("{msg}");
            }
            report_failure(&e);
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("Starting scraper in a background thread...");
    let handle = spawn_worker(engine).context("Failed to start scraper worker")?;
    tracing::debug!(run_id = %handle.run_id(), "Worker spawned");

    // The channel closes once the worker drops the engine.
    while let Some(msg) = rx.recv().await {
        println!("{msg}");
    }

    let outcome = tokio::task::spawn_blocking(move || handle.join())
        .await
        .context("Scraper worker could not be joined")?;

    match outcome {
        Ok(records) if records.is_empty() => {
            println!("Scraper finished without collecting any data. Check your selectors and URLs.");
            Ok(ExitCode::SUCCESS)
        }
        Ok(_) => {
            let config = ScraperConfig::load(config_path)
                .with_context(|| format!("Failed to reload {}", config_path.display()))?;
            println!("{}", describe_output(&config).await);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            report_failure(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn cmd_preview(config_path: &Path) -> Result<ExitCode> {
    let config = ScraperConfig::load(config_path)?;
    let path = config.output_path()?;
    let format = config.output_format()?;

    if !path.exists() {
        println!("No output file found at {}.", path.display());
        return Ok(ExitCode::FAILURE);
    }

    let summary = summarize_output(format, &path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    println!("{summary}");
    Ok(ExitCode::SUCCESS)
}

fn report_failure(e: &AppError) {
    tracing::error!(error = %e, "Scraper run failed");
    if e.is_fatal() {
        println!("Scraper error: {e}");
    } else {
        println!("Unexpected error: {e}");
    }
}
