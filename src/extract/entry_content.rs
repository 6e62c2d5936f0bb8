//! WordPress-style extraction for the human-rights sites that run stock
//! WordPress themes, where the article body lives in an `entry-content` (or
//! plain `article`) container. Site-specific: on other sites these containers
//! also wrap related-links blocks, which the generic rule's stop-phrase
//! boundary handles instead.

use scraper::{Html, Selector};

use super::{collect_paragraphs, ExtractStrategy};

const MIN_PARAGRAPH_CHARS: usize = 50;

/// Sites known to keep a clean article body in the WordPress containers.
const SITE_PATTERNS: &[&str] = &["iranhrs.org", "iran-hrm.com"];

/// Paragraphs that are cookie/consent notices, not article text.
const COOKIE_MARKERS: &[&str] = &["cookie", "کوکی", "consent", "privacy policy"];

pub struct EntryContentStrategy;

impl ExtractStrategy for EntryContentStrategy {
    fn name(&self) -> &'static str {
        "entry-content"
    }

    fn matches(&self, url: &str) -> bool {
        SITE_PATTERNS.iter().any(|pattern| url.contains(pattern))
    }

    fn extract(&self, document: &Html) -> Vec<String> {
        let container = Selector::parse(".entry-content, .post-content, article")
            .expect("entry-content selector");
        let Some(root) = document.select(&container).next() else {
            return Vec::new();
        };

        collect_paragraphs(root, MIN_PARAGRAPH_CHARS)
            .into_iter()
            .filter(|p| {
                let lower = p.to_lowercase();
                !COOKIE_MARKERS.iter().any(|m| lower.contains(m))
            })
            .collect()
    }
}
