//! Text helpers used throughout the pipeline.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Truncate a string for logging purposes, appending a byte-count indicator.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…(+{} bytes)", head, s.len() - head.len())
    }
}

/// First `n` characters of a string, on char boundaries.
pub fn char_prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Collapse all whitespace runs to single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Strip markup from an HTML fragment, returning its visible text.
///
/// Used on RSS summary fields, which routinely embed markup.
pub fn strip_html(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    let text: String = doc.root_element().text().collect::<Vec<_>>().join(" ");
    normalize_whitespace(&text)
}

/// Count characters in the Perso-Arabic block (U+0600..U+06FF).
///
/// Proxy for "is this prose in the target language" in the density-based
/// extraction fallback.
pub fn perso_arabic_count(text: &str) -> usize {
    text.chars()
        .filter(|c| ('\u{0600}'..='\u{06FF}').contains(c))
        .count()
}

/// Detect and remove duplicated text content.
///
/// Some extraction paths yield the same article body twice back to back
/// (listing teaser + full text, or a template that repeats the lead). If the
/// leading chunk of the text recurs later, everything from the second
/// occurrence on is cut.
pub fn deduplicate_text(text: &str) -> String {
    if text.chars().count() < 100 {
        return text.to_string();
    }

    let clean = normalize_whitespace(text);
    let chunk = char_prefix(&clean, 80);
    if chunk.is_empty() {
        return text.to_string();
    }

    let Some(first_pos) = clean.find(&chunk) else {
        return text.to_string();
    };
    if clean[first_pos + chunk.len()..].find(&chunk).is_none() {
        return text.to_string();
    }

    // Duplication confirmed in the normalized view; find the repeat point in
    // the original text using a shorter probe, then cut there.
    let probe = char_prefix(text.trim(), 60);
    if probe.is_empty() {
        return text.to_string();
    }
    if let Some(first) = text.find(&probe) {
        let after = first + probe.len();
        if let Some(rel) = text[after..].find(&probe) {
            return text[..after + rel].trim().to_string();
        }
    }

    text.to_string()
}
