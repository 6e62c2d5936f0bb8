//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! All paths can be provided via command-line flags or environment variables.

use clap::Parser;

/// Command-line arguments for the news bot.
///
/// # Examples
///
/// ```sh
/// # Run the scheduler with the built-in source registry
/// newsbot
///
/// # Single pass with a config file
/// newsbot --once -c config.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file; the built-in defaults apply
    /// otherwise
    #[arg(short, long)]
    pub config: Option<String>,

    /// Run a single pass and exit instead of looping on the schedule
    #[arg(long)]
    pub once: bool,

    /// Path of the seen-items cache document
    #[arg(long, env = "NEWS_CACHE_FILE", default_value = "news_cache.json")]
    pub cache_file: String,

    /// Path of the duplicate-detector history document
    #[arg(long, env = "DUPLICATE_CACHE_FILE", default_value = "duplicate_cache.json")]
    pub dedup_cache_file: String,

    /// Park accepted items in this JSON review queue instead of publishing
    /// them directly
    #[arg(long, env = "REVIEW_QUEUE_FILE")]
    pub review_queue_file: Option<String>,

    /// Approve a pending review entry by id, then exit
    #[arg(long, value_name = "ID")]
    pub approve: Option<String>,

    /// Reject a pending review entry by id, then exit
    #[arg(long, value_name = "ID")]
    pub reject: Option<String>,

    /// Purge detector history entries older than this many days, then exit
    #[arg(long)]
    pub cleanup_days: Option<i64>,
}
