//! # AI Daily Digest
//!
//! Collects AI-related articles from RSS feeds and registered HTML pages,
//! scores them, and renders a static daily digest page.
//!
//! ## Usage
//!
//! ```sh
//! ai_daily_digest -c config.yaml -s state.json -o docs
//! ```
//!
//! ## Architecture
//!
//! One run is a straight pipeline:
//! 1. **Loading**: read `config.yaml` and the persisted run state
//! 2. **Collecting**: fetch each source in order through the SSRF-checked
//!    fetcher, enrich articles (main image, fallback summary), drop ids that
//!    were already pushed, condense and score the rest
//! 3. **Selecting**: merge with today's earlier picks, dedup, rank, keep the
//!    top 8 news and top 5 research articles
//! 4. **Output**: write `index.html` when anything was selected, then always
//!    save the state

use std::error::Error;

use chrono::Local;
use clap::Parser;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod extract;
mod fetch;
mod keywords;
mod models;
mod outputs;
mod pipeline;
mod scoring;
mod sources;
mod state;
mod utils;

use cli::Cli;
use config::Config;
use extract::Extractor;
use fetch::{FetchConfig, SafeFetcher};
use outputs::html;
use state::RunState;

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
    info!("ai_daily_digest starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.state, ?args.output_dir, ?args.date, "Parsed CLI arguments");

    // ---- Load config & state (both fatal on failure) ----
    let config = Config::load(&args.config).await?;
    let mut run_state = RunState::load(&args.state).await?;
    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    info!(%today, "Run date");

    // ---- Collect candidates ----
    let fetcher = SafeFetcher::new(FetchConfig::default());
    let image_keywords = config.image_keywords();
    let extractor = Extractor::new(&fetcher, &image_keywords);
    let scorer = config.scorer();

    let candidates =
        pipeline::collect_candidates(&config.sources, &run_state.pushed_ids, &extractor, &scorer)
            .await;
    if candidates.is_empty() {
        info!("No unseen articles this run");
    }
    debug!(count = candidates.len(), "Candidates ready for selection");

    // ---- Select ----
    let selection = run_state.select(today, candidates);

    if selection.is_empty() {
        info!("No new articles found; skipping page generation");
    } else {
        for article in selection.iter() {
            info!(
                title = %article.title,
                score = article.score,
                source = %article.source,
                "Selected"
            );
        }

        let page = html::render_page(today, &selection.news, &selection.tech);
        if let Err(e) = html::write_page(&args.output_dir, &page).await {
            error!(
                path = %args.output_dir.display(),
                error = %e,
                "Failed writing digest page"
            );
        }
    }

    // ---- Persist state ----
    run_state.save(&args.state).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        news = selection.news.len(),
        tech = selection.tech.len(),
        "Execution complete"
    );

    Ok(())
}
