//! AI text-service collaborator.
//!
//! The service rewrites an article into a multi-language summary, returned as
//! one string with recognizable section markers. This module owns the trait
//! contract, a retry decorator for flaky backends, the marker parser, and a
//! passthrough implementation for running without a backend at all.

use std::time::Duration;

use rand::Rng;
use tracing::{instrument, warn};

use crate::error::Result;
use crate::models::ProcessedText;

const SECTION_NAMES: &[&str] = &["PERSIAN", "ENGLISH", "GERMAN", "TAGS"];
/// Unstructured responses shorter than this are refusals or error blurbs;
/// fall back to the input content instead.
const MIN_RAW_RESPONSE_CHARS: usize = 100;

/// One article-processing call against the AI backend.
pub trait ProcessAsync {
    async fn process(&self, title: &str, content: &str) -> Result<String>;
}

/// Retry decorator: exponential backoff with jitter around any
/// [`ProcessAsync`] implementation.
pub struct RetryProcess<P> {
    inner: P,
    max_retries: u32,
    base_delay: Duration,
}

impl<P: ProcessAsync> RetryProcess<P> {
    pub fn new(inner: P, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
        }
    }
}

impl<P: ProcessAsync> ProcessAsync for RetryProcess<P> {
    #[instrument(level = "debug", skip_all, fields(title = %crate::utils::truncate_for_log(title, 60)))]
    async fn process(&self, title: &str, content: &str) -> Result<String> {
        let mut delay = self.base_delay;
        let mut attempt = 0;
        loop {
            match self.inner.process(title, content).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    let jitter = Duration::from_millis(rand::rng().random_range(0..=250));
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Text service call failed; backing off"
                    );
                    tokio::time::sleep(delay + jitter).await;
                    delay = (delay * 2).min(Duration::from_secs(30));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// No-backend implementation: echoes the content as the Persian section.
pub struct Passthrough;

impl ProcessAsync for Passthrough {
    async fn process(&self, _title: &str, content: &str) -> Result<String> {
        Ok(format!("===PERSIAN===\n{}", content))
    }
}

/// Parse a marker-delimited response into [`ProcessedText`].
///
/// A response with no markers at all is treated as an unstructured Persian
/// rewrite when long enough, else the caller's `fallback` text is used.
pub fn parse_sections(raw: &str, fallback: &str) -> ProcessedText {
    if !SECTION_NAMES
        .iter()
        .any(|name| raw.contains(&format!("==={}===", name)))
    {
        let raw = raw.trim();
        let persian = if raw.chars().count() > MIN_RAW_RESPONSE_CHARS {
            raw.to_string()
        } else {
            fallback.to_string()
        };
        return ProcessedText {
            persian,
            ..ProcessedText::default()
        };
    }

    let mut parsed = ProcessedText::default();
    let mut tokens = raw.split("===").peekable();
    while let Some(token) = tokens.next() {
        let name = token.trim();
        if !SECTION_NAMES.contains(&name) {
            continue;
        }
        let body = tokens.next().map(str::trim).unwrap_or_default();
        match name {
            "PERSIAN" => parsed.persian = body.to_string(),
            "ENGLISH" => parsed.english = body.to_string(),
            "GERMAN" => parsed.german = body.to_string(),
            "TAGS" => {
                parsed.tags = body
                    .split([',', '،'])
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => {}
        }
    }

    if parsed.persian.is_empty() {
        parsed.persian = fallback.to_string();
    }
    parsed
}
