//! Command-line interface definitions for the AI daily digest.
//!
//! All arguments can be provided via command-line flags or environment variables.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for one digest run.
///
/// # Examples
///
/// ```sh
/// # Defaults: ./config.yaml, ./state.json, ./docs/index.html
/// ai_daily_digest
///
/// # Explicit paths, run as if it were another day
/// ai_daily_digest -c sources.yaml -s /var/lib/digest/state.json -o ./site --date 2025-05-06
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the sources configuration (YAML)
    #[arg(short, long, env = "DIGEST_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Path to the persisted run state (JSON)
    #[arg(short, long, env = "DIGEST_STATE", default_value = "state.json")]
    pub state: PathBuf,

    /// Directory the digest page is written to
    #[arg(short, long, env = "DIGEST_OUTPUT_DIR", default_value = "docs")]
    pub output_dir: PathBuf,

    /// Run date (YYYY-MM-DD); defaults to today's local date
    #[arg(long, env = "DIGEST_DATE")]
    pub date: Option<NaiveDate>,
}
