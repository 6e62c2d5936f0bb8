//! Persistence for the fetcher's seen cache and the duplicate detector's
//! history.
//!
//! Both documents are read fully at startup and rewritten whole after each
//! mutation. The write is synchronous: the process is low-frequency and
//! crash-safety matters more than throughput here. Failure semantics follow
//! the pipeline's degrade-don't-crash rule: a read error yields empty state
//! (everything looks new), a write error is logged and swallowed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::PublishedEntry;

/// Fetcher-side cache: ids and exact titles that have already been proposed
/// and published. Used as the pre-filter during listing fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeenCache {
    #[serde(default)]
    pub seen_ids: HashSet<String>,
    #[serde(default)]
    pub seen_titles: HashSet<String>,
}

/// Detector-side history. Every accepted item is reflected in all five index
/// structures before the next decision is made.
///
/// `full_titles` and `seen_urls` are ordered so the bounded fuzzy windows and
/// oldest-first trimming are well defined.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorState {
    #[serde(default)]
    pub title_hashes: HashSet<String>,
    #[serde(default)]
    pub url_hashes: HashSet<String>,
    #[serde(default)]
    pub content_hashes: HashSet<String>,
    #[serde(default)]
    pub full_titles: Vec<String>,
    #[serde(default)]
    pub seen_urls: Vec<String>,
    #[serde(default)]
    pub published_entries: Vec<PublishedEntry>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Storage medium behind the seen cache and the detector history. Swappable
/// without touching detection logic.
pub trait HistoryStore: Send + Sync {
    fn load_seen(&self) -> SeenCache;
    fn save_seen(&self, cache: &SeenCache);
    fn load_state(&self) -> DetectorState;
    fn save_state(&self, state: &DetectorState);
}

/// Flat-file JSON store, one document per concern.
pub struct JsonFileStore {
    seen_path: PathBuf,
    state_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(seen_path: impl Into<PathBuf>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            seen_path: seen_path.into(),
            state_path: state_path.into(),
        }
    }

    fn read_doc<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> T {
        if !path.exists() {
            return T::default();
        }
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt cache document; starting empty");
                    T::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read cache document; starting empty");
                T::default()
            }
        }
    }

    fn write_doc<T: Serialize>(path: &Path, doc: &T) {
        let raw = match serde_json::to_string_pretty(doc) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot serialize cache document");
                return;
            }
        };
        if let Err(e) = std::fs::write(path, raw) {
            warn!(path = %path.display(), error = %e, "Cannot write cache document; continuing in memory");
        }
    }
}

impl HistoryStore for JsonFileStore {
    fn load_seen(&self) -> SeenCache {
        let cache: SeenCache = Self::read_doc(&self.seen_path);
        info!(
            ids = cache.seen_ids.len(),
            titles = cache.seen_titles.len(),
            "Loaded seen cache"
        );
        cache
    }

    fn save_seen(&self, cache: &SeenCache) {
        Self::write_doc(&self.seen_path, cache);
    }

    fn load_state(&self) -> DetectorState {
        let state: DetectorState = Self::read_doc(&self.state_path);
        info!(
            titles = state.full_titles.len(),
            urls = state.seen_urls.len(),
            entries = state.published_entries.len(),
            "Loaded duplicate history"
        );
        state
    }

    fn save_state(&self, state: &DetectorState) {
        Self::write_doc(&self.state_path, state);
    }
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    seen: RwLock<SeenCache>,
    state: RwLock<DetectorState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryStore {
    fn load_seen(&self) -> SeenCache {
        self.seen.read().expect("seen lock").clone()
    }

    fn save_seen(&self, cache: &SeenCache) {
        *self.seen.write().expect("seen lock") = cache.clone();
    }

    fn load_state(&self) -> DetectorState {
        self.state.read().expect("state lock").clone()
    }

    fn save_state(&self, state: &DetectorState) {
        *self.state.write().expect("state lock") = state.clone();
    }
}
