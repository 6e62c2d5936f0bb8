//! Data models shared across the pipeline.
//!
//! - [`NewsItem`]: one discovered candidate article from a listing or feed
//! - [`ArticleContent`]: result of full-article extraction
//! - [`PublishedEntry`]: compact fingerprint of a published item, kept in the
//!   duplicate detector's time-windowed history
//! - [`PostRef`]: what the publishing collaborator returns
//! - [`ProcessedText`]: parsed multi-language output of the AI text service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Minimum number of characters of joined article text for an extraction to
/// count as successful. Shorter results fall back to the listing description.
pub const MIN_CONTENT_CHARS: usize = 50;

/// A candidate article discovered from a source listing or feed.
///
/// Created by the fetcher, read-only downstream. Not retained beyond the run
/// except via the duplicate detector's fingerprints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    /// Content-derived fingerprint of cleaned title + link.
    pub id: String,
    pub title: String,
    /// Absolute URL, resolved against the source base URL.
    pub link: String,
    /// Short teaser text from the listing/feed, not the full content.
    pub description: String,
    pub source_name: String,
    pub source_category: String,
    pub language: String,
    pub image_url: Option<String>,
    /// Absent for scraped listings that carry no date.
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

impl NewsItem {
    /// Stable fingerprint for a (title, link) pair.
    ///
    /// Punctuation is stripped from the title before hashing so that trivial
    /// quoting differences between listings do not change the id.
    pub fn fingerprint(title: &str, link: &str) -> String {
        let clean_title: String = title
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();
        let unique = format!("{}_{}", clean_title.trim(), link);
        hex::encode(Sha256::digest(unique.as_bytes()))
    }
}

/// Result of full-article extraction.
///
/// `success` is true only when the joined paragraph text exceeds
/// [`MIN_CONTENT_CHARS`]; callers must fall back to the listing description
/// otherwise. Construct via [`ArticleContent::from_paragraphs`] or
/// [`ArticleContent::failed`] so the invariant holds.
#[derive(Debug, Clone, Default)]
pub struct ArticleContent {
    /// Ordered, cleaned text blocks. Order matters.
    pub paragraphs: Vec<String>,
    /// Absolute URL, preferring `og:image` over inferred images.
    pub main_image: Option<String>,
    pub success: bool,
}

impl ArticleContent {
    pub fn from_paragraphs(paragraphs: Vec<String>, main_image: Option<String>) -> Self {
        let len: usize = paragraphs.join("\n\n").chars().count();
        Self {
            success: len > MIN_CONTENT_CHARS,
            paragraphs,
            main_image,
        }
    }

    /// Empty, unsuccessful result. Used for total fetch/parse failure.
    pub fn failed() -> Self {
        Self::default()
    }

    pub fn joined(&self) -> String {
        self.paragraphs.join("\n\n")
    }
}

/// One published item in the detector's time-windowed history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedEntry {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub post_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Reference to a created blog post, returned by the publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    pub id: String,
    pub url: String,
}

/// Multi-language output of the AI text service, parsed from its
/// section-marker format. Missing sections stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedText {
    pub persian: String,
    pub english: String,
    pub german: String,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_stable() {
        let a = NewsItem::fingerprint("Some headline", "https://example.com/1");
        let b = NewsItem::fingerprint("Some headline", "https://example.com/1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_ignores_punctuation() {
        let a = NewsItem::fingerprint("Some, headline!", "https://example.com/1");
        let b = NewsItem::fingerprint("Some headline", "https://example.com/1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_distinguishes_links() {
        let a = NewsItem::fingerprint("Some headline", "https://example.com/1");
        let b = NewsItem::fingerprint("Some headline", "https://example.com/2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_content_length_gate() {
        // 49 chars -> failure, 51 chars -> success; the boundary is 50.
        let short = ArticleContent::from_paragraphs(vec!["a".repeat(49)], None);
        assert!(!short.success);

        let exact = ArticleContent::from_paragraphs(vec!["a".repeat(50)], None);
        assert!(!exact.success);

        let long = ArticleContent::from_paragraphs(vec!["a".repeat(51)], None);
        assert!(long.success);
    }

    #[test]
    fn test_content_length_counts_chars_not_bytes() {
        // 51 Persian characters are 102 UTF-8 bytes; the gate is on chars.
        let text = "ن".repeat(51);
        let content = ArticleContent::from_paragraphs(vec![text], None);
        assert!(content.success);

        let text = "ن".repeat(49);
        let content = ArticleContent::from_paragraphs(vec![text], None);
        assert!(!content.success);
    }

    #[test]
    fn test_joined_preserves_order() {
        let content = ArticleContent::from_paragraphs(
            vec!["first".to_string(), "second".to_string(), "third".to_string()],
            None,
        );
        assert_eq!(content.joined(), "first\n\nsecond\n\nthird");
    }

    #[test]
    fn test_failed_is_unsuccessful_and_empty() {
        let content = ArticleContent::failed();
        assert!(!content.success);
        assert!(content.paragraphs.is_empty());
        assert!(content.main_image.is_none());
    }
}
