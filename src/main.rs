//! # newsbot
//!
//! A news aggregation and publishing pipeline for Persian human-rights
//! sources. It fetches candidate articles from RSS feeds and HTML-scraped
//! listing pages, extracts full article text and a representative image,
//! filters duplicates against a persisted history, optionally rewrites the
//! text through an AI collaborator, and forwards accepted items to a
//! publishing backend.
//!
//! ## Usage
//!
//! ```sh
//! newsbot --once          # one pass
//! newsbot -c config.yaml  # scheduler with a config file
//! ```
//!
//! ## Architecture
//!
//! One pass is a strictly sequential pipeline:
//! 1. **Fetching**: collect candidates from each enabled source
//! 2. **Filtering**: age filter, then the duplicate-detection cascade
//! 3. **Extraction**: strategy cascade over the article page
//! 4. **Processing**: AI rewrite with marker-based section parsing
//! 5. **Publishing**: HTML body build, post creation, history mark

use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod ai;
mod cli;
mod config;
mod dedup;
mod error;
mod extract;
mod fetcher;
mod http;
mod models;
mod pipeline;
mod publish;
mod review;
mod store;
mod utils;

use ai::Passthrough;
use cli::Cli;
use config::AppConfig;
use dedup::DuplicateDetector;
use fetcher::NewsFetcher;
use http::HttpClient;
use pipeline::Pipeline;
use publish::{Publisher, RecordingPublisher};
use review::{QueuePublisher, ReviewQueue, ReviewStatus};
use store::JsonFileStore;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("newsbot starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.cache_file, ?args.dedup_cache_file, "Parsed CLI arguments");

    if args.approve.is_some() || args.reject.is_some() {
        let Some(path) = &args.review_queue_file else {
            return Err("--approve/--reject require --review-queue-file".into());
        };
        let mut queue = ReviewQueue::open(path);
        let decisions = [
            (&args.approve, ReviewStatus::Approved),
            (&args.reject, ReviewStatus::Rejected),
        ];
        for (id, status) in decisions {
            if let Some(id) = id {
                match queue.decide(id, status) {
                    Some(entry) => info!(%id, title = %entry.title, ?status, "Review decided"),
                    None => match queue.get(id) {
                        Some(entry) => {
                            warn!(%id, status = ?entry.status, "Entry was already decided")
                        }
                        None => warn!(%id, "Unknown review id"),
                    },
                }
            }
        }
        return Ok(());
    }

    let config = AppConfig::load(args.config.as_deref())?;
    let store = Arc::new(JsonFileStore::new(&args.cache_file, &args.dedup_cache_file));

    let client = HttpClient::new(
        config.request_timeout_secs,
        config.use_proxy,
        config.proxy_urls.clone(),
    )?;
    let fetcher = NewsFetcher::new(client.clone(), store.clone());
    let mut detector = DuplicateDetector::new(config.dedup.clone(), store);

    let stats = detector.stats();
    info!(
        titles = stats.total_titles,
        urls = stats.total_urls,
        entries = stats.total_entries,
        title_hashes = stats.title_hashes,
        content_hashes = stats.content_hashes,
        "Duplicate history loaded"
    );

    if let Some(days) = args.cleanup_days {
        detector.cleanup_old_entries(days);
        info!(days, entries = detector.stats().total_entries, "History cleanup done");
        return Ok(());
    }

    // No live publishing or AI backend is wired in yet; accepted items go to
    // the review queue when one is configured, otherwise to a recording
    // backend, until real collaborators are plugged into the trait seams.
    match &args.review_queue_file {
        Some(path) => {
            let publisher = QueuePublisher::open(path);
            let pipeline = Pipeline::new(config, client, fetcher, detector, publisher, Passthrough);
            run(pipeline, args.once).await;
        }
        None => {
            let publisher = RecordingPublisher::new();
            let pipeline = Pipeline::new(config, client, fetcher, detector, publisher, Passthrough);
            run(pipeline, args.once).await;
        }
    }

    Ok(())
}

async fn run<P: Publisher>(mut pipeline: Pipeline<P, Passthrough>, once: bool) {
    if once {
        let summary = pipeline.run_once().await;
        info!(published = summary.published, "Single pass finished");
    } else {
        pipeline.run_scheduler().await;
    }
}
