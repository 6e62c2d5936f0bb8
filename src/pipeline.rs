//! Pipeline orchestration: one pass takes listings to published posts.
//!
//! The run is strictly sequential. Every skip is logged with its reason and
//! counted; no single item failure halts the pass. History mutation happens
//! only after the downstream publish succeeds, so a failed publish leaves the
//! item eligible for the next run.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::ai::{parse_sections, ProcessAsync};
use crate::config::AppConfig;
use crate::dedup::DuplicateDetector;
use crate::extract::ArticleExtractor;
use crate::fetcher::NewsFetcher;
use crate::http::HttpClient;
use crate::models::{NewsItem, ProcessedText, MIN_CONTENT_CHARS};
use crate::publish::{build_post_html, labels_for_source, Publisher};
use crate::utils::{deduplicate_text, truncate_for_log};

/// Outcome counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub published: usize,
    pub skipped_old: usize,
    pub skipped_duplicate: usize,
    pub skipped_empty: usize,
    pub failed_publish: usize,
}

pub struct Pipeline<P, A> {
    config: AppConfig,
    client: HttpClient,
    fetcher: NewsFetcher,
    detector: DuplicateDetector,
    extractor: ArticleExtractor,
    publisher: P,
    ai: A,
}

impl<P: Publisher, A: ProcessAsync> Pipeline<P, A> {
    pub fn new(
        config: AppConfig,
        client: HttpClient,
        fetcher: NewsFetcher,
        detector: DuplicateDetector,
        publisher: P,
        ai: A,
    ) -> Self {
        Self {
            config,
            client,
            fetcher,
            detector,
            extractor: ArticleExtractor::new(),
            publisher,
            ai,
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn detector(&self) -> &DuplicateDetector {
        &self.detector
    }

    /// One full pass: fetch all listings, then process each candidate.
    #[instrument(level = "info", skip_all)]
    pub async fn run_once(&mut self) -> RunSummary {
        let items = self.fetcher.fetch_all(&self.config).await;
        self.process_items(items).await
    }

    pub async fn process_items(&mut self, items: Vec<NewsItem>) -> RunSummary {
        let mut summary = RunSummary::default();

        for item in items {
            if self.too_old(&item) {
                info!(title = %truncate_for_log(&item.title, 60), "Skipped: too old");
                summary.skipped_old += 1;
                continue;
            }

            let (duplicate, reason) =
                self.detector
                    .is_duplicate(&item.title, &item.link, &item.description);
            if duplicate {
                info!(
                    title = %truncate_for_log(&item.title, 60),
                    reason,
                    "Skipped: duplicate"
                );
                summary.skipped_duplicate += 1;
                continue;
            }

            let content = self
                .extractor
                .fetch_article(&self.client, &item.link, self.config.use_proxy)
                .await;
            let body = if content.success {
                content.joined()
            } else {
                item.description.clone()
            };

            let mut text = match self.ai.process(&item.title, &body).await {
                Ok(raw) => parse_sections(&raw, &body),
                Err(e) => {
                    warn!(error = %e, "Text service failed; publishing the raw text");
                    ProcessedText {
                        persian: body.clone(),
                        ..ProcessedText::default()
                    }
                }
            };

            text.persian = deduplicate_text(&text.persian);
            if text.persian.chars().count() < MIN_CONTENT_CHARS {
                info!(
                    title = %truncate_for_log(&item.title, 60),
                    "Skipped: no usable content"
                );
                summary.skipped_empty += 1;
                continue;
            }

            let html = build_post_html(&item, &text, content.main_image.as_deref());
            let mut labels = labels_for_source(&item.source_name);
            for tag in &text.tags {
                if !labels.contains(tag) {
                    labels.push(tag.clone());
                }
            }

            match self
                .publisher
                .create_post(&item.title, &html, &labels, false)
                .await
            {
                Ok(post) => {
                    self.fetcher.mark_seen(&item.title, &item.id);
                    self.detector
                        .mark_as_published(&item.title, &item.link, &body, &post.id);
                    summary.published += 1;
                    info!(
                        title = %truncate_for_log(&item.title, 60),
                        post_id = %post.id,
                        url = %post.url,
                        "Published"
                    );
                }
                Err(e) => {
                    // Not marked anywhere; the item stays eligible.
                    warn!(
                        title = %truncate_for_log(&item.title, 60),
                        error = %e,
                        "Publish failed"
                    );
                    summary.failed_publish += 1;
                    continue;
                }
            }

            if self.config.publish_delay_secs > 0 {
                tokio::time::sleep(Duration::from_secs(self.config.publish_delay_secs)).await;
            }
        }

        info!(
            published = summary.published,
            skipped_old = summary.skipped_old,
            skipped_duplicate = summary.skipped_duplicate,
            skipped_empty = summary.skipped_empty,
            failed_publish = summary.failed_publish,
            "Pass complete"
        );
        summary
    }

    /// Run forever: one pass now, then one every `check_interval_hours`.
    pub async fn run_scheduler(&mut self) {
        let interval = Duration::from_secs(self.config.check_interval_hours * 3600);
        loop {
            self.run_once().await;
            info!(hours = self.config.check_interval_hours, "Sleeping until next pass");
            tokio::time::sleep(interval).await;
        }
    }

    /// Undated items (scraped listings) are never age-filtered.
    fn too_old(&self, item: &NewsItem) -> bool {
        match item.published_at {
            Some(published_at) => {
                Utc::now() - published_at > chrono::Duration::hours(self.config.max_item_age_hours)
            }
            None => false,
        }
    }
}
