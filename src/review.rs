//! Optional human-review queue.
//!
//! Items can be parked for approval instead of publishing directly. The queue
//! is a keyed, JSON-persisted map of typed records; a status enum replaces
//! free-form state so a record can never be half-approved. The pipeline runs
//! fine without a queue at all.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::Result;
use crate::models::PostRef;
use crate::publish::Publisher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

/// One item awaiting review, keyed by its correlation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingReview {
    pub id: String,
    pub title: String,
    pub html: String,
    pub labels: Vec<String>,
    pub status: ReviewStatus,
    pub queued_at: DateTime<Utc>,
}

/// JSON-file-backed review queue. Same degrade-don't-crash persistence rules
/// as the history store: unreadable document loads empty, write failures are
/// logged and swallowed.
pub struct ReviewQueue {
    path: PathBuf,
    entries: BTreeMap<String, PendingReview>,
}

impl ReviewQueue {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::read(&path);
        info!(path = %path.display(), pending = entries.len(), "Opened review queue");
        Self { path, entries }
    }

    fn read(path: &Path) -> BTreeMap<String, PendingReview> {
        if !path.exists() {
            return BTreeMap::new();
        }
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Corrupt review queue; starting empty");
                BTreeMap::new()
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read review queue; starting empty");
                BTreeMap::new()
            }
        }
    }

    fn persist(&self) {
        match serde_json::to_string_pretty(&self.entries) {
            Ok(raw) => {
                if let Err(e) = std::fs::write(&self.path, raw) {
                    warn!(path = %self.path.display(), error = %e, "Cannot write review queue");
                }
            }
            Err(e) => warn!(error = %e, "Cannot serialize review queue"),
        }
    }

    /// Park an item as pending. Re-queuing an existing id overwrites it.
    pub fn enqueue(&mut self, review: PendingReview) {
        self.entries.insert(review.id.clone(), review);
        self.persist();
    }

    pub fn get(&self, id: &str) -> Option<&PendingReview> {
        self.entries.get(id)
    }

    /// Move a pending record to a terminal status. Returns the updated record,
    /// or `None` when the id is unknown or already decided.
    pub fn decide(&mut self, id: &str, status: ReviewStatus) -> Option<PendingReview> {
        debug_assert_ne!(status, ReviewStatus::Pending);
        let entry = self.entries.get_mut(id)?;
        if entry.status != ReviewStatus::Pending {
            return None;
        }
        entry.status = status;
        let decided = entry.clone();
        self.persist();
        Some(decided)
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingReview> {
        self.entries
            .values()
            .filter(|r| r.status == ReviewStatus::Pending)
    }
}

/// Publisher backend that parks posts for human approval instead of sending
/// them anywhere. The returned [`PostRef`] carries the review id, so the
/// pipeline records the item as handled and will not re-propose it.
pub struct QueuePublisher {
    queue: Mutex<ReviewQueue>,
}

impl QueuePublisher {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            queue: Mutex::new(ReviewQueue::open(path)),
        }
    }
}

impl Publisher for QueuePublisher {
    async fn create_post(
        &self,
        title: &str,
        html: &str,
        labels: &[String],
        _is_draft: bool,
    ) -> Result<PostRef> {
        // Stable per (title, body), so a re-queued item overwrites its own
        // pending record instead of piling up.
        let id = hex::encode(Sha256::digest(format!("{}\n{}", title, html).as_bytes()));
        let mut queue = self.queue.lock().expect("queue lock");
        queue.enqueue(PendingReview {
            id: id.clone(),
            title: title.to_string(),
            html: html.to_string(),
            labels: labels.to_vec(),
            status: ReviewStatus::Pending,
            queued_at: Utc::now(),
        });
        Ok(PostRef {
            url: format!("review://pending/{}", id),
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("newsbot_review_{}_{}.json", tag, std::process::id()))
    }

    fn review(id: &str) -> PendingReview {
        PendingReview {
            id: id.to_string(),
            title: "A headline".to_string(),
            html: "<p>body</p>".to_string(),
            labels: vec!["حقوق بشر".to_string()],
            status: ReviewStatus::Pending,
            queued_at: Utc::now(),
        }
    }

    #[test]
    fn test_enqueue_and_decide() {
        let path = temp_path("decide");
        let mut queue = ReviewQueue::open(&path);
        queue.enqueue(review("a"));
        queue.enqueue(review("b"));
        assert_eq!(queue.pending().count(), 2);

        let decided = queue.decide("a", ReviewStatus::Approved).unwrap();
        assert_eq!(decided.status, ReviewStatus::Approved);
        assert_eq!(queue.pending().count(), 1);

        // A decided record cannot be decided again.
        assert!(queue.decide("a", ReviewStatus::Rejected).is_none());
        assert_eq!(
            queue.get("a").map(|r| r.status),
            Some(ReviewStatus::Approved)
        );

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_unknown_id_yields_none() {
        let path = temp_path("unknown");
        let mut queue = ReviewQueue::open(&path);
        assert!(queue.decide("nope", ReviewStatus::Approved).is_none());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_queue_publisher_parks_posts() {
        let path = temp_path("publisher");
        let labels = vec!["حقوق بشر".to_string()];
        let publisher = QueuePublisher::open(&path);

        let post = publisher
            .create_post("Title", "<p>body</p>", &labels, false)
            .await
            .unwrap();
        assert!(post.url.starts_with("review://pending/"));

        // The same post queued twice collapses into one pending record.
        let again = publisher
            .create_post("Title", "<p>body</p>", &labels, false)
            .await
            .unwrap();
        assert_eq!(post.id, again.id);

        let queue = ReviewQueue::open(&path);
        assert_eq!(queue.pending().count(), 1);
        assert_eq!(queue.get(&post.id).map(|r| r.title.as_str()), Some("Title"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_queue_survives_reopen() {
        let path = temp_path("reopen");
        {
            let mut queue = ReviewQueue::open(&path);
            queue.enqueue(review("persisted"));
        }
        let queue = ReviewQueue::open(&path);
        assert!(queue.get("persisted").is_some());
        assert_eq!(queue.pending().count(), 1);
        let _ = std::fs::remove_file(path);
    }
}
