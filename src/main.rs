//! # News Digest
//!
//! Collects headlines from Korean and global news sources, merges the same
//! story reported by several outlets, ranks the result and renders a daily
//! digest.
//!
//! ## Features
//!
//! - Fetches the Naver ranking page and a set of RSS feeds (Google News,
//!   Yonhap, SisaIN, BBC, CNN and others) concurrently
//! - Merges near-duplicate headlines across outlets and flags stories carried
//!   by two or more sources as hot
//! - Selects a bounded front page with per-category quotas
//! - Optionally asks an OpenAI-compatible LLM for counter perspectives
//! - Writes JSON snapshots, a Markdown archive, an email HTML body and an RSS
//!   feed; `serve` exposes the same data over HTTP
//!
//! ## Usage
//!
//! ```sh
//! news_digest run --archive-dir ./archive
//! news_digest serve --port 3100
//! ```
//!
//! ## Architecture
//!
//! 1. **Gathering**: every source is fetched at once; failures are recorded,
//!    never fatal on their own
//! 2. **Merging**: headlines are clustered by title similarity
//! 3. **Selection**: category quotas first, then hotness
//! 4. **Perspectives**: optional LLM pass over a few selected stories
//! 5. **Output**: every renderer runs even if another one fails

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cache;
mod cli;
mod config;
mod engine;
mod error;
mod llm;
mod models;
mod outputs;
mod perspective;
mod pipeline;
mod retry;
mod scrapers;
mod server;
mod trends;
mod utils;

use cli::{Cli, Command, RunArgs, ServeArgs};
use config::Settings;
use llm::LlmPerspectiveGenerator;
use server::{AppState, ServerConfig};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "news_digest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = Settings::load(args.config.as_deref())?;

    match args.command {
        Command::Run(run_args) => run(settings, run_args).await?,
        Command::Serve(serve_args) => serve(settings, serve_args).await?,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// One batch run: gather, rank, annotate, write.
async fn run(settings: Settings, args: RunArgs) -> Result<(), Box<dyn Error>> {
    let archive_dir = &args.outputs.archive_dir;
    // Early check: fail before any network traffic if nothing can be written
    if let Err(e) = ensure_writable_dir(archive_dir).await {
        error!(
            path = %archive_dir.display(),
            error = %e,
            "Archive directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let client = scrapers::http_client()?;
    let sources = scrapers::default_sources();
    info!(sources = sources.len(), "Collecting headlines");

    let collection = pipeline::gather(&client, &sources).await;
    for failure in &collection.failures {
        warn!(source = %failure.source, error = %failure.error, "Source unavailable this run");
    }

    let mut digest = match pipeline::build_digest(collection, &settings, Utc::now()) {
        Ok(digest) => digest,
        Err(e) => {
            error!(error = %e, "No digest produced");
            return Err(e.into());
        }
    };
    info!(
        articles = digest.articles.len(),
        hot = digest.hot_count(),
        failures = digest.failures.len(),
        "Digest built"
    );

    if args.no_llm || args.perspectives == 0 {
        info!("Counter perspectives disabled");
    } else {
        match LlmPerspectiveGenerator::load(&args.template).await {
            Ok(generator) => pipeline::annotate(&mut digest, &generator, args.perspectives).await,
            Err(e) => warn!(error = %e, "LLM unavailable; continuing without counter perspectives"),
        }
    }

    let written = outputs::write_all(&digest, args.outputs.options()).await;
    if written.is_empty() {
        return Err("no output file could be written".into());
    }
    Ok(())
}

/// Long-running HTTP mode.
async fn serve(settings: Settings, args: ServeArgs) -> Result<(), Box<dyn Error>> {
    let client = scrapers::http_client()?;
    let config = ServerConfig {
        settings,
        archive_dir: args.outputs.archive_dir,
        today_path: args.outputs.today_news_path,
        refresh_url: args.outputs.refresh_url,
        site_url: args.outputs.site_url,
    };
    let state = AppState::new(config, client, scrapers::default_sources());
    server::serve(state, args.port).await
}
