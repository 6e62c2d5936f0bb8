//! Full-article content extraction.
//!
//! Sites in the registry share no markup conventions, so extraction is an
//! ordered cascade of strategies rather than one parser. Each strategy is a
//! [`ExtractStrategy`] implementation; the extractor walks the cascade and
//! stops at the first strategy that yields at least [`MIN_PARAGRAPHS`]
//! paragraphs. When no strategy reaches that bar, the first non-empty result
//! wins anyway: two good paragraphs beat none.
//!
//! The representative image is independent of the text rule: `og:image` from
//! the raw document, `twitter:image` as fallback, resolved absolute.
//!
//! Total failure is an empty unsuccessful [`ArticleContent`], never an error.

mod density;
mod entry_content;
mod generic;
mod metadata;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::http::HttpClient;
use crate::models::ArticleContent;
use crate::utils::normalize_whitespace;

pub use density::DensityStrategy;
pub use entry_content::EntryContentStrategy;
pub use generic::GenericStrategy;
pub use metadata::MetadataStrategy;

/// A strategy is "good enough" when it finds this many paragraphs; fewer and
/// the cascade keeps trying.
const MIN_PARAGRAPHS: usize = 3;
/// Hard cap on paragraphs carried downstream. Truncation is marked with an
/// ellipsis paragraph.
const MAX_PARAGRAPHS: usize = 15;

/// One extraction rule. `matches` gates the rule by article URL (site-specific
/// rules), `extract` pulls ordered paragraph text out of a parsed document.
pub trait ExtractStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn matches(&self, url: &str) -> bool;
    fn extract(&self, document: &Html) -> Vec<String>;
}

pub struct ArticleExtractor {
    strategies: Vec<Box<dyn ExtractStrategy>>,
}

impl Default for ArticleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleExtractor {
    /// The standard cascade: site-specific metadata rule, WordPress-style
    /// container rule, generic containers, language-density last resort.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(MetadataStrategy),
                Box::new(EntryContentStrategy),
                Box::new(GenericStrategy),
                Box::new(DensityStrategy),
            ],
        }
    }

    /// Fetch and extract one article. Fetch failure degrades to an empty
    /// unsuccessful result.
    #[instrument(level = "debug", skip(self, client))]
    pub async fn fetch_article(
        &self,
        client: &HttpClient,
        url: &str,
        use_proxy: bool,
    ) -> ArticleContent {
        let Some(body) = client.get_text(url, use_proxy).await else {
            warn!(%url, "Article fetch failed");
            return ArticleContent::failed();
        };
        self.parse_article(&body, url)
    }

    /// Run the cascade over a raw HTML document.
    pub fn parse_article(&self, body: &str, url: &str) -> ArticleContent {
        let document = Html::parse_document(body);

        let mut best: Option<(&'static str, Vec<String>)> = None;
        for strategy in &self.strategies {
            if !strategy.matches(url) {
                continue;
            }
            let paragraphs = strategy.extract(&document);
            debug!(
                strategy = strategy.name(),
                paragraphs = paragraphs.len(),
                "Extraction attempt"
            );
            if paragraphs.len() >= MIN_PARAGRAPHS {
                best = Some((strategy.name(), paragraphs));
                break;
            }
            if !paragraphs.is_empty() && best.is_none() {
                best = Some((strategy.name(), paragraphs));
            }
        }

        let mut paragraphs = match best {
            Some((name, paragraphs)) => {
                debug!(strategy = name, count = paragraphs.len(), "Extraction result");
                paragraphs
            }
            None => Vec::new(),
        };

        if paragraphs.len() > MAX_PARAGRAPHS {
            paragraphs.truncate(MAX_PARAGRAPHS);
            paragraphs.push("…".to_string());
        }

        if let Some(lead) = lead_paragraph(&document, &paragraphs) {
            paragraphs.insert(0, lead);
        }

        ArticleContent::from_paragraphs(paragraphs, main_image(&document, url))
    }
}

/// `og:image` with `twitter:image` fallback, resolved against the article URL.
fn main_image(document: &Html, url: &str) -> Option<String> {
    let og = Selector::parse(r#"meta[property="og:image"]"#).expect("og:image selector");
    let twitter = Selector::parse(r#"meta[name="twitter:image"], meta[property="twitter:image"]"#)
        .expect("twitter:image selector");

    let raw = document
        .select(&og)
        .chain(document.select(&twitter))
        .find_map(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|s| !s.is_empty())?;

    match Url::parse(url).and_then(|base| base.join(raw)) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(_) => Some(raw.to_string()),
    }
}

/// The page's own summary (`og:description`), prepended as a lead paragraph
/// unless the extracted text already opens with the same material.
fn lead_paragraph(document: &Html, paragraphs: &[String]) -> Option<String> {
    let selector = Selector::parse(r#"meta[property="og:description"], meta[name="description"]"#)
        .expect("description selector");
    let lead = document
        .select(&selector)
        .find_map(|el| el.value().attr("content"))
        .map(normalize_whitespace)
        .filter(|s| s.chars().count() > 30)?;

    if let Some(first) = paragraphs.first() {
        let first = normalize_whitespace(first);
        if first.contains(&lead) || lead.contains(&first) {
            return None;
        }
    }
    Some(lead)
}

/// Class/id substrings that mark navigation and template furniture.
const BOILERPLATE_MARKERS: &[&str] = &[
    "comment", "share", "social", "related", "sidebar", "menu", "footer",
    "header", "widget", "advert", "banner", "promo", "cookie", "breadcrumb",
];

const BOILERPLATE_ELEMENTS: &[&str] = &["nav", "footer", "aside", "header", "form", "script", "style"];

/// True when the element sits inside a navigation/footer/ad subtree. Used as
/// an ancestor predicate instead of mutating the parsed document.
pub(crate) fn in_boilerplate(element: ElementRef<'_>) -> bool {
    for ancestor in element.ancestors() {
        let Some(el) = ElementRef::wrap(ancestor) else { continue };
        let value = el.value();
        if BOILERPLATE_ELEMENTS.contains(&value.name()) {
            return true;
        }
        let mut markers = value
            .attr("class")
            .into_iter()
            .chain(value.attr("id"))
            .map(str::to_lowercase);
        if markers.any(|attr| BOILERPLATE_MARKERS.iter().any(|m| attr.contains(m))) {
            return true;
        }
    }
    false
}

/// Ordered visible-text paragraphs under `root`, boilerplate subtrees
/// skipped, short fragments dropped.
pub(crate) fn collect_paragraphs(root: ElementRef<'_>, min_chars: usize) -> Vec<String> {
    let p = Selector::parse("p").expect("p selector");
    root.select(&p)
        .filter(|el| !in_boilerplate(*el))
        .map(|el| normalize_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| text.chars().count() > min_chars)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_image_prefers_og_image() {
        let html = r#"<html><head>
            <meta property="og:image" content="/img/main.jpg">
            <meta name="twitter:image" content="https://cdn.example.com/tw.jpg">
        </head><body></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(
            main_image(&document, "https://example.com/news/1"),
            Some("https://example.com/img/main.jpg".to_string())
        );
    }

    #[test]
    fn test_main_image_twitter_fallback() {
        let html = r#"<html><head>
            <meta name="twitter:image" content="https://cdn.example.com/tw.jpg">
        </head><body></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(
            main_image(&document, "https://example.com/news/1"),
            Some("https://cdn.example.com/tw.jpg".to_string())
        );
    }

    #[test]
    fn test_lead_prepended_when_absent_from_text() {
        let html = r#"<html><head>
            <meta property="og:description" content="An official summary of this article, different from the body text entirely.">
        </head><body><div class="content">
            <p>The body of the article starts somewhere else and says different things at length.</p>
            <p>It continues with more reporting and detail in this second long paragraph here.</p>
            <p>A third paragraph closes out the report with additional context and statements.</p>
        </div></body></html>"#;
        let content = ArticleExtractor::new().parse_article(html, "https://example.com/a");
        assert!(content.success);
        assert_eq!(content.paragraphs.len(), 4);
        assert!(content.paragraphs[0].starts_with("An official summary"));
    }

    #[test]
    fn test_lead_skipped_when_body_opens_with_it() {
        let summary = "An official summary of this article that the body also opens with verbatim.";
        let html = format!(
            r#"<html><head><meta property="og:description" content="{summary}"></head>
            <body><div class="content">
                <p>{summary}</p>
                <p>It continues with more reporting and detail in this second long paragraph here.</p>
                <p>A third paragraph closes out the report with additional context and statements.</p>
            </div></body></html>"#
        );
        let content = ArticleExtractor::new().parse_article(&html, "https://example.com/a");
        assert_eq!(content.paragraphs.len(), 3);
        assert!(content.paragraphs[0].starts_with("An official summary"));
        assert!(content.paragraphs[1].starts_with("It continues"));
    }

    #[test]
    fn test_boilerplate_subtrees_skipped() {
        let html = r#"<html><body><div class="content">
            <p>A real paragraph of article text that is comfortably long enough to keep around.</p>
            <div class="related-posts"><p>You might also like this other article from our archive today.</p></div>
            <footer><p>Copyright notice that lives inside the page footer and must never appear.</p></footer>
            <p>Another real paragraph of article text, also comfortably long enough to keep.</p>
            <p>A third real paragraph so the generic rule is satisfied on its first container.</p>
        </div></body></html>"#;
        let content = ArticleExtractor::new().parse_article(html, "https://example.com/a");
        assert_eq!(content.paragraphs.len(), 3);
        assert!(content.joined().contains("A real paragraph"));
        assert!(!content.joined().contains("Copyright notice"));
        assert!(!content.joined().contains("also like"));
    }

    #[test]
    fn test_stop_phrase_bounds_cascade_output() {
        // The boundary has to hold through the whole cascade, not just the
        // generic rule in isolation: nothing after the marker may leak in
        // from a later strategy either.
        let html = r#"<html><body><article>
            <p>Security forces raided several homes before dawn, residents of the area said.</p>
            <p>At least four people were taken to an undisclosed location, their families added.</p>
            <p>Read more coverage in our related articles section and subscribe for updates.</p>
            <p>Teaser for an unrelated story about fuel prices rising across the country.</p>
            <p>Teaser for an unrelated story about a football match postponed this weekend.</p>
            <p>Teaser for an unrelated story about weather warnings issued for the north.</p>
        </article></body></html>"#;
        let content = ArticleExtractor::new().parse_article(html, "https://example.com/news/raid");
        assert_eq!(content.paragraphs.len(), 2);
        assert!(content.paragraphs[0].starts_with("Security forces"));
        assert!(content.paragraphs[1].starts_with("At least four"));
        assert!(!content.joined().contains("related articles"));
        assert!(!content.joined().contains("Teaser"));
    }

    #[test]
    fn test_wordpress_rule_reserved_for_known_sites() {
        let html = r#"<html><body><div class="entry-content">
            <p>First long paragraph of the article with plenty of text to clear the length bar.</p>
            <p>Second long paragraph of the article, also with plenty of text to clear the bar.</p>
            <p>Read more about this topic in our related articles section further down the page.</p>
            <p>Unrelated teaser paragraph that only the site template appends after the boundary.</p>
        </div></body></html>"#;

        // Known site: the WordPress rule applies and takes the container whole.
        let on_site = ArticleExtractor::new().parse_article(html, "https://iranhrs.org/post/1");
        assert_eq!(on_site.paragraphs.len(), 4);

        // Anywhere else the generic rule's boundary governs.
        let elsewhere = ArticleExtractor::new().parse_article(html, "https://example.com/post/1");
        assert_eq!(elsewhere.paragraphs.len(), 2);
    }

    #[test]
    fn test_paragraph_cap_marks_truncation() {
        let paragraphs: String = (0..30)
            .map(|i| {
                format!(
                    "<p>Paragraph number {i} with enough filler text to clear the minimum length bar easily.</p>"
                )
            })
            .collect();
        let html = format!("<html><body><article>{paragraphs}</article></body></html>");
        let content = ArticleExtractor::new().parse_article(&html, "https://example.com/a");
        assert_eq!(content.paragraphs.len(), MAX_PARAGRAPHS + 1);
        assert_eq!(content.paragraphs.last().map(String::as_str), Some("…"));
    }

    #[test]
    fn test_empty_document_fails_without_error() {
        let content = ArticleExtractor::new().parse_article("<html><body></body></html>", "https://example.com/a");
        assert!(!content.success);
        assert!(content.paragraphs.is_empty());
        assert!(content.main_image.is_none());
    }
}
