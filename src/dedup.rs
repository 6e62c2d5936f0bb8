//! Duplicate detection against the persisted publication history.
//!
//! The detector is the single gatekeeper for "has this already been
//! published" and the single mutator of the persisted history. A decision is
//! synchronous and total: every call returns a verdict plus a human-readable
//! reason, checked through a fixed cascade (exact URL, published URL, exact
//! title, known title, fuzzy title, content fingerprint, recent fuzzy title).
//! First hit wins.
//!
//! Thresholds are empirically chosen and carried as configuration, not
//! constants; do not assume the defaults are principled.

use std::sync::Arc;

use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::models::PublishedEntry;
use crate::store::{DetectorState, HistoryStore};
use crate::utils::char_prefix;

/// Leading editorial prefixes stripped before title comparison, Persian and
/// English variants.
static TITLE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(خبر|گزارش|ویدیو|عکس|فوری|breaking|report|video|photo)[:\s]+")
        .expect("title prefix regex")
});
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("punctuation regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static URL_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(www\.)?").expect("url scheme regex"));

/// Tunable knobs of the decision cascade. Defaults mirror the values the
/// history was built with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Fuzzy title similarity threshold against the title history (inclusive).
    pub similarity_threshold: f64,
    /// Stricter threshold for the time-windowed recency check (inclusive).
    pub recent_similarity_threshold: f64,
    /// Entries older than this are ignored by the recency check only.
    pub recent_window_hours: i64,
    /// How many of the most recent titles the fuzzy check scans.
    pub fuzzy_title_window: usize,
    /// How many of the most recent published entries the recency check scans.
    pub recent_entry_window: usize,
    /// Content shorter than this is never fingerprinted.
    pub content_min_chars: usize,
    pub max_titles: usize,
    pub max_urls: usize,
    pub max_entries: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.75,
            recent_similarity_threshold: 0.80,
            recent_window_hours: 48,
            fuzzy_title_window: 200,
            recent_entry_window: 100,
            content_min_chars: 100,
            max_titles: 1000,
            max_urls: 1000,
            max_entries: 500,
        }
    }
}

/// Index sizes, for startup logging and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorStats {
    pub total_titles: usize,
    pub total_urls: usize,
    pub total_entries: usize,
    pub title_hashes: usize,
    pub content_hashes: usize,
}

pub struct DuplicateDetector {
    config: DetectorConfig,
    state: DetectorState,
    store: Arc<dyn HistoryStore>,
}

/// Strip editorial prefixes and punctuation, collapse whitespace, case-fold.
pub fn normalize_title(title: &str) -> String {
    let title = TITLE_PREFIX.replace(title, "");
    let title = PUNCTUATION.replace_all(&title, "");
    let title = WHITESPACE.replace_all(&title, " ");
    title.trim().to_lowercase()
}

/// Strip query/fragment/trailing slash/scheme/www, case-fold.
pub fn normalize_url(url: &str) -> String {
    let url = url.split('?').next().unwrap_or(url);
    let url = url.split('#').next().unwrap_or(url);
    let url = url.trim_end_matches('/');
    URL_SCHEME.replace(url, "").to_lowercase()
}

fn hash_hex(s: &str) -> String {
    hex::encode(Sha256::digest(s.as_bytes()))
}

pub fn title_hash(title: &str) -> String {
    hash_hex(&normalize_title(title))
}

pub fn url_hash(url: &str) -> String {
    hash_hex(&normalize_url(url))
}

/// Fingerprint of the first 500 characters, whitespace-collapsed and
/// case-folded. Catches re-published articles whose titles were reworded.
pub fn content_hash(content: &str) -> String {
    let snippet = char_prefix(content, 500);
    let snippet = WHITESPACE.replace_all(&snippet, " ");
    hash_hex(&snippet.trim().to_lowercase())
}

/// Symmetric character-level similarity of the normalized titles, in 0.0..=1.0.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_title(a), &normalize_title(b))
}

impl DuplicateDetector {
    pub fn new(config: DetectorConfig, store: Arc<dyn HistoryStore>) -> Self {
        let state = store.load_state();
        Self { config, state, store }
    }

    /// Decide whether a candidate is a duplicate of something already
    /// published. Read-only; call [`mark_as_published`](Self::mark_as_published)
    /// after a successful publish to record the item.
    #[instrument(level = "debug", skip_all, fields(url = %url))]
    pub fn is_duplicate(&self, title: &str, url: &str, content: &str) -> (bool, String) {
        // 1. Exact normalized-URL hash.
        if self.state.url_hashes.contains(&url_hash(url)) {
            return (true, "URL already seen".to_string());
        }

        // 2. Raw or normalized membership in the published-URL history.
        let normalized_url = normalize_url(url);
        if self.state.seen_urls.iter().any(|u| u == url)
            || self.state.seen_urls.iter().any(|u| normalize_url(u) == normalized_url)
        {
            return (true, "URL already published".to_string());
        }

        // 3. Exact normalized-title hash.
        if self.state.title_hashes.contains(&title_hash(title)) {
            return (true, "Exact title match".to_string());
        }

        // 4. Normalized-title equality against the full title history.
        let normalized_title = normalize_title(title);
        if self
            .state
            .full_titles
            .iter()
            .any(|t| normalize_title(t) == normalized_title)
        {
            return (true, "Title already exists".to_string());
        }

        // 5. Fuzzy similarity against the most recent titles only; scanning
        // the full history would make every decision O(history).
        let window_start = self
            .state
            .full_titles
            .len()
            .saturating_sub(self.config.fuzzy_title_window);
        for existing in &self.state.full_titles[window_start..] {
            let similarity = title_similarity(title, existing);
            if similarity >= self.config.similarity_threshold {
                return (
                    true,
                    format!(
                        "Similar title ({:.0}%): {}...",
                        similarity * 100.0,
                        char_prefix(existing, 50)
                    ),
                );
            }
        }

        // 6. Content fingerprint, only for substantial content.
        if content.chars().count() > self.config.content_min_chars
            && self.state.content_hashes.contains(&content_hash(content))
        {
            return (true, "Content fingerprint match".to_string());
        }

        // 7. Stricter fuzzy check against recent publications. Entries older
        // than the window are ignored here but still count everywhere else.
        let now = Utc::now();
        let cutoff = Duration::hours(self.config.recent_window_hours);
        let entry_start = self
            .state
            .published_entries
            .len()
            .saturating_sub(self.config.recent_entry_window);
        for entry in &self.state.published_entries[entry_start..] {
            if now - entry.timestamp > cutoff {
                continue;
            }
            if title_similarity(title, &entry.title) >= self.config.recent_similarity_threshold {
                return (
                    true,
                    format!("Recent similar: {}...", char_prefix(&entry.title, 40)),
                );
            }
        }

        (false, "OK - New content".to_string())
    }

    /// Record a published item in every index and persist immediately.
    ///
    /// Must be called after the downstream publish succeeds, not before: a
    /// failed publish leaves the item eligible for a future run.
    #[instrument(level = "debug", skip_all, fields(url = %url))]
    pub fn mark_as_published(&mut self, title: &str, url: &str, content: &str, post_id: &str) {
        self.state.title_hashes.insert(title_hash(title));
        self.state.url_hashes.insert(url_hash(url));
        if !self.state.full_titles.iter().any(|t| t == title) {
            self.state.full_titles.push(title.to_string());
        }
        if !self.state.seen_urls.iter().any(|u| u == url) {
            self.state.seen_urls.push(url.to_string());
        }
        if content.chars().count() > self.config.content_min_chars {
            self.state.content_hashes.insert(content_hash(content));
        }
        self.state.published_entries.push(PublishedEntry {
            title: title.to_string(),
            url: url.to_string(),
            post_id: post_id.to_string(),
            timestamp: Utc::now(),
        });

        self.trim_bounds();
        self.save();
    }

    /// Purge history entries older than `days`. On-demand maintenance, not
    /// part of the accept/reject path.
    pub fn cleanup_old_entries(&mut self, days: i64) {
        let cutoff = Utc::now() - Duration::days(days);
        let before = self.state.published_entries.len();
        self.state.published_entries.retain(|e| e.timestamp > cutoff);
        debug!(
            removed = before - self.state.published_entries.len(),
            "Purged old published entries"
        );
        self.save();
    }

    pub fn stats(&self) -> DetectorStats {
        DetectorStats {
            total_titles: self.state.full_titles.len(),
            total_urls: self.state.seen_urls.len(),
            total_entries: self.state.published_entries.len(),
            title_hashes: self.state.title_hashes.len(),
            content_hashes: self.state.content_hashes.len(),
        }
    }

    fn trim_bounds(&mut self) {
        let state = &mut self.state;
        if state.full_titles.len() > self.config.max_titles {
            let excess = state.full_titles.len() - self.config.max_titles;
            state.full_titles.drain(..excess);
        }
        if state.seen_urls.len() > self.config.max_urls {
            let excess = state.seen_urls.len() - self.config.max_urls;
            state.seen_urls.drain(..excess);
        }
        if state.published_entries.len() > self.config.max_entries {
            let excess = state.published_entries.len() - self.config.max_entries;
            state.published_entries.drain(..excess);
        }
    }

    fn save(&mut self) {
        self.state.last_updated = Some(Utc::now());
        self.store.save_state(&self.state);
    }
}
