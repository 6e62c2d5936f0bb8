//! Metadata-based extraction for sites that render the article body with
//! scripts but still ship it in structured data. Applies to iranintl-style
//! pages where the visible DOM holds almost no prose.

use scraper::{Html, Selector};
use serde_json::Value;

use super::ExtractStrategy;
use crate::utils::normalize_whitespace;

const MIN_BODY_CHARS: usize = 30;

pub struct MetadataStrategy;

impl ExtractStrategy for MetadataStrategy {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn matches(&self, url: &str) -> bool {
        url.contains("iranintl")
    }

    fn extract(&self, document: &Html) -> Vec<String> {
        let mut paragraphs = Vec::new();

        let description = Selector::parse(r#"meta[name="description"], meta[property="og:description"]"#)
            .expect("description selector");
        if let Some(text) = document
            .select(&description)
            .find_map(|el| el.value().attr("content"))
            .map(normalize_whitespace)
            .filter(|s| s.chars().count() > MIN_BODY_CHARS)
        {
            paragraphs.push(text);
        }

        let ld_json =
            Selector::parse(r#"script[type="application/ld+json"]"#).expect("ld+json selector");
        for script in document.select(&ld_json) {
            let raw = script.text().collect::<String>();
            let Ok(value) = serde_json::from_str::<Value>(&raw) else { continue };
            if let Some(body) = find_article_body(&value) {
                for block in body.split('\n') {
                    let block = normalize_whitespace(block);
                    if block.chars().count() > MIN_BODY_CHARS && !paragraphs.contains(&block) {
                        paragraphs.push(block);
                    }
                }
            }
        }

        paragraphs
    }
}

/// First `articleBody` string anywhere in a JSON-LD document, including
/// `@graph` wrappers and arrays.
fn find_article_body(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(body)) = map.get("articleBody") {
                return Some(body);
            }
            map.values().find_map(find_article_body)
        }
        Value::Array(items) => items.iter().find_map(find_article_body),
        _ => None,
    }
}
