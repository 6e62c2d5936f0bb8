//! Feed and listing fetcher: turns a source descriptor into a capped list of
//! [`NewsItem`] candidates, pre-filtered against the seen cache so one run
//! never proposes the same item twice.
//!
//! RSS sources go through a tolerant feed parse (a malformed feed degrades to
//! zero entries). Scraped sources go through the configured CSS selectors
//! with two fallbacks: common article containers, then anchors whose href
//! carries a date-like path segment (several targets publish listing pages
//! with no semantic markup at all).

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument, warn};
use url::Url;

use crate::config::{AppConfig, FetchMode, SourceConfig};
use crate::http::HttpClient;
use crate::models::NewsItem;
use crate::store::{HistoryStore, SeenCache};
use crate::utils::{char_prefix, normalize_whitespace, strip_html};

/// Titles shorter than this are navigation or ad links, not articles.
const MIN_TITLE_CHARS: usize = 10;
/// Cap on RSS teaser length.
const MAX_DESCRIPTION_CHARS: usize = 500;

const DEFAULT_ARTICLES_SELECTOR: &str = "article, .post, .entry";
const DEFAULT_TITLE_SELECTOR: &str = "h2 a, h3 a, .title a, a";
const DEFAULT_DESCRIPTION_SELECTOR: &str = "p, .excerpt, .summary";

static DATE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/20\d{2}").expect("date path regex"));

pub struct NewsFetcher {
    client: HttpClient,
    seen: SeenCache,
    store: Arc<dyn HistoryStore>,
}

impl NewsFetcher {
    pub fn new(client: HttpClient, store: Arc<dyn HistoryStore>) -> Self {
        let seen = store.load_seen();
        Self { client, seen, store }
    }

    pub fn is_seen(&self, title: &str, id: &str) -> bool {
        self.seen.seen_ids.contains(id) || self.seen.seen_titles.contains(title)
    }

    /// Record an item in the seen cache and persist immediately.
    pub fn mark_seen(&mut self, title: &str, id: &str) {
        self.seen.seen_ids.insert(id.to_string());
        self.seen.seen_titles.insert(title.to_string());
        self.store.save_seen(&self.seen);
    }

    /// Fetch all enabled sources in registry order, applying the run-level cap.
    #[instrument(level = "info", skip_all)]
    pub async fn fetch_all(&mut self, config: &AppConfig) -> Vec<NewsItem> {
        let mut all = Vec::new();
        let mut proposed: HashSet<String> = HashSet::new();

        for source in config.enabled_sources() {
            let items = self.fetch_listing(source).await;
            for item in items {
                // A feed and a scraped listing can surface the same story in
                // one run; propose it once.
                if proposed.insert(item.id.clone()) {
                    all.push(item);
                }
            }
        }

        all.truncate(config.max_news_per_check);
        info!(count = all.len(), "Collected candidate items");
        all
    }

    /// Fetch one source's listing, pre-filtered and capped.
    #[instrument(level = "info", skip_all, fields(source = %source.name))]
    pub async fn fetch_listing(&self, source: &SourceConfig) -> Vec<NewsItem> {
        let items = match source.mode {
            FetchMode::Rss => self.fetch_rss(source).await,
            FetchMode::Scrape => self.fetch_scrape(source).await,
        };
        self.filter_new(items, source.max_items)
    }

    /// Drop already-seen items and within-listing repeats, then apply the
    /// per-source hard cap.
    fn filter_new(&self, items: Vec<NewsItem>, cap: usize) -> Vec<NewsItem> {
        let mut kept = Vec::new();
        let mut ids = HashSet::new();
        for item in items {
            if kept.len() >= cap {
                break;
            }
            if self.is_seen(&item.title, &item.id) {
                continue;
            }
            if !ids.insert(item.id.clone()) {
                continue;
            }
            kept.push(item);
        }
        kept
    }

    async fn fetch_rss(&self, source: &SourceConfig) -> Vec<NewsItem> {
        let url = source.rss_url.as_deref().unwrap_or(&source.url);
        let Some(body) = self.client.get_text(url, false).await else {
            warn!(%url, "Could not fetch feed");
            return Vec::new();
        };
        parse_feed(&body, source)
    }

    async fn fetch_scrape(&self, source: &SourceConfig) -> Vec<NewsItem> {
        let Some(body) = self.client.get_text(&source.url, source.use_proxy).await else {
            warn!(url = %source.url, "Could not fetch listing page");
            return Vec::new();
        };
        parse_listing(&body, source)
    }
}

/// Parse an RSS/Atom document into candidate items. Malformed feeds yield
/// zero entries, not an error.
pub fn parse_feed(body: &str, source: &SourceConfig) -> Vec<NewsItem> {
    let feed = match feed_rs::parser::parse(body.as_bytes()) {
        Ok(feed) => feed,
        Err(e) => {
            warn!(source = %source.name, error = %e, "Feed parse failed");
            return Vec::new();
        }
    };

    feed.entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry.title.as_ref().map(|t| normalize_whitespace(&t.content))?;
            if title.is_empty() {
                return None;
            }
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;

            let description = entry
                .summary
                .as_ref()
                .map(|t| char_prefix(&strip_html(&t.content), MAX_DESCRIPTION_CHARS))
                .unwrap_or_default();

            let image_url = entry.media.iter().find_map(|media| {
                media
                    .content
                    .iter()
                    .find_map(|c| c.url.as_ref().map(|u| u.to_string()))
                    .or_else(|| media.thumbnails.first().map(|t| t.image.uri.clone()))
            });

            let published_at = entry.published.or(entry.updated);

            Some(NewsItem {
                id: NewsItem::fingerprint(&title, &link),
                title,
                link,
                description,
                source_name: source.name.clone(),
                source_category: source.category.clone(),
                language: source.language.clone(),
                image_url,
                published_at,
                fetched_at: Utc::now(),
            })
        })
        .collect()
}

/// Parse a scraped listing page into candidate items.
pub fn parse_listing(body: &str, source: &SourceConfig) -> Vec<NewsItem> {
    let document = Html::parse_document(body);
    let Ok(base) = Url::parse(&source.url) else {
        warn!(url = %source.url, "Source URL does not parse; skipping listing");
        return Vec::new();
    };

    let elements = candidate_elements(&document, source);
    if elements.is_empty() {
        return date_anchor_fallback(&document, &base, source);
    }

    let title_selector = parse_selector(
        source.selectors.title.as_deref().unwrap_or(DEFAULT_TITLE_SELECTOR),
        DEFAULT_TITLE_SELECTOR,
    );
    let description_selector = parse_selector(
        source
            .selectors
            .description
            .as_deref()
            .unwrap_or(DEFAULT_DESCRIPTION_SELECTOR),
        DEFAULT_DESCRIPTION_SELECTOR,
    );
    let anchor_selector = Selector::parse("a[href]").expect("anchor selector");
    let image_selector = Selector::parse("img").expect("img selector");

    let mut items = Vec::new();
    for element in elements {
        let Some(title_el) = element
            .select(&title_selector)
            .next()
            .or_else(|| first_heading(element))
        else {
            continue;
        };

        let title = normalize_whitespace(&title_el.text().collect::<Vec<_>>().join(" "));
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }

        let href = if title_el.value().name() == "a" {
            title_el.value().attr("href")
        } else {
            title_el
                .select(&anchor_selector)
                .next()
                .or_else(|| element.select(&anchor_selector).next())
                .and_then(|a| a.value().attr("href"))
        };
        let Some(href) = href else { continue };
        let Ok(link) = base.join(href) else { continue };
        let link = link.to_string();

        let description = element
            .select(&description_selector)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default();

        let image_url = element.select(&image_selector).next().and_then(|img| {
            let v = img.value();
            v.attr("src")
                .or_else(|| v.attr("data-src"))
                .or_else(|| v.attr("data-lazy-src"))
                .and_then(|src| base.join(src).ok())
                .map(|u| u.to_string())
        });

        items.push(NewsItem {
            id: NewsItem::fingerprint(&title, &link),
            title,
            link,
            description,
            source_name: source.name.clone(),
            source_category: source.category.clone(),
            language: source.language.clone(),
            image_url,
            // Scraped listings carry no reliable date.
            published_at: None,
            fetched_at: Utc::now(),
        });
    }
    items
}

fn parse_selector(configured: &str, fallback: &'static str) -> Selector {
    Selector::parse(configured)
        .unwrap_or_else(|_| Selector::parse(fallback).expect("fallback selector"))
}

fn candidate_elements<'a>(document: &'a Html, source: &SourceConfig) -> Vec<ElementRef<'a>> {
    let configured = source
        .selectors
        .articles
        .as_deref()
        .unwrap_or(DEFAULT_ARTICLES_SELECTOR);
    if let Ok(selector) = Selector::parse(configured) {
        let found: Vec<_> = document.select(&selector).collect();
        if !found.is_empty() {
            return found;
        }
    }

    for fallback in [
        "article",
        r#"div[class*="post"], div[class*="article"], div[class*="news"]"#,
    ] {
        let selector = Selector::parse(fallback).expect("fallback articles selector");
        let found: Vec<_> = document.select(&selector).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

fn first_heading(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    static HEADING: Lazy<Selector> =
        Lazy::new(|| Selector::parse("h2, h3, h4").expect("heading selector"));
    element.select(&HEADING).next()
}

/// Last-resort listing rule: anchors whose href looks like a dated article
/// path. Matches sites that render listings as bare link walls.
fn date_anchor_fallback(document: &Html, base: &Url, source: &SourceConfig) -> Vec<NewsItem> {
    let anchor_selector = Selector::parse("a[href]").expect("anchor selector");
    let mut items = Vec::new();
    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else { continue };
        if !DATE_PATH.is_match(href) {
            continue;
        }
        let title = normalize_whitespace(&anchor.text().collect::<Vec<_>>().join(" "));
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }
        let Ok(link) = base.join(href) else { continue };
        let link = link.to_string();
        items.push(NewsItem {
            id: NewsItem::fingerprint(&title, &link),
            title,
            link,
            description: String::new(),
            source_name: source.name.clone(),
            source_category: source.category.clone(),
            language: source.language.clone(),
            image_url: None,
            published_at: None,
            fetched_at: Utc::now(),
        });
    }
    items
}
