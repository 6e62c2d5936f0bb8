//! Last-resort extraction: no container rule fit, so take every paragraph on
//! the page that reads like target-language prose and is not template text.

use itertools::Itertools;
use scraper::{Html, Selector};

use super::{in_boilerplate, ExtractStrategy};
use crate::utils::{normalize_whitespace, perso_arabic_count};

/// Paragraphs with fewer Perso-Arabic characters than this are navigation,
/// bylines, or Latin-script furniture.
const MIN_PERSO_ARABIC_CHARS: usize = 30;
const MIN_PARAGRAPH_CHARS: usize = 50;

const BLACKLIST: &[&str] = &[
    "تبلیغات",
    "تماس با ما",
    "کپی رایت",
    "خبرنامه",
    "اشتراک",
    "all rights reserved",
    "copyright",
    "advertisement",
];

pub struct DensityStrategy;

impl ExtractStrategy for DensityStrategy {
    fn name(&self) -> &'static str {
        "density"
    }

    fn matches(&self, _url: &str) -> bool {
        true
    }

    fn extract(&self, document: &Html) -> Vec<String> {
        let p = Selector::parse("p").expect("p selector");
        document
            .select(&p)
            .filter(|el| !in_boilerplate(*el))
            .map(|el| normalize_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
            .filter(|text| {
                text.chars().count() > MIN_PARAGRAPH_CHARS
                    && perso_arabic_count(text) > MIN_PERSO_ARABIC_CHARS
                    && !is_blacklisted(text)
            })
            .unique()
            .collect()
    }
}

fn is_blacklisted(text: &str) -> bool {
    let lower = text.to_lowercase();
    BLACKLIST.iter().any(|marker| lower.contains(marker))
}
