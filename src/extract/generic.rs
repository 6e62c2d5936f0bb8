//! Generic container extraction: walk a fixed list of likely content
//! containers and take paragraphs from the first one that has any.
//!
//! Collection stops at the first stop-phrase paragraph. The phrases mark the
//! end of the article proper ("read more", newsletter prompts, related-links
//! blocks), so everything after them is template, not content. A boundary,
//! not a filter.

use scraper::{Html, Selector};

use super::{collect_paragraphs, ExtractStrategy};

const MIN_PARAGRAPH_CHARS: usize = 30;

const CONTAINERS: &[&str] = &[
    "article",
    ".entry-content",
    ".post-content",
    ".content",
    "main",
    "body",
];

const STOP_PHRASES: &[&str] = &[
    "ادامه مطلب",
    "مطالب مرتبط",
    "بیشتر بخوانید",
    "عضویت در خبرنامه",
    "read more",
    "related articles",
    "newsletter",
];

pub struct GenericStrategy;

impl ExtractStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn matches(&self, _url: &str) -> bool {
        true
    }

    fn extract(&self, document: &Html) -> Vec<String> {
        for container in CONTAINERS {
            let selector = Selector::parse(container).expect("container selector");
            let Some(root) = document.select(&selector).next() else {
                continue;
            };

            let mut paragraphs = Vec::new();
            for paragraph in collect_paragraphs(root, MIN_PARAGRAPH_CHARS) {
                if is_stop_phrase(&paragraph) {
                    break;
                }
                paragraphs.push(paragraph);
            }
            if !paragraphs.is_empty() {
                return paragraphs;
            }
        }
        Vec::new()
    }
}

fn is_stop_phrase(paragraph: &str) -> bool {
    let lower = paragraph.to_lowercase();
    STOP_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_phrase_terminates_collection() {
        let html = r#"<html><body><div class="content">
            <p>First paragraph of the article body with enough length to be collected.</p>
            <p>Second paragraph of the article body, also long enough to be collected.</p>
            <p>Read more about this topic and subscribe for further coverage of events.</p>
            <p>Third paragraph that sits after the boundary and must never be collected.</p>
        </div></body></html>"#;
        let document = Html::parse_document(html);
        let paragraphs = GenericStrategy.extract(&document);
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[1].starts_with("Second paragraph"));
    }

    #[test]
    fn test_persian_stop_phrase() {
        let html = r#"<html><body><main>
            <p>بازداشت شدگان روز گذشته به مکان نامعلومی منتقل شدند و خانواده ها بی خبرند.</p>
            <p>ادامه مطلب را در وبسایت ما دنبال کنید و در خبرنامه عضو شوید.</p>
            <p>این بند پس از مرز است و نباید هرگز در خروجی ظاهر شود چون محتوای قالب است.</p>
        </main></body></html>"#;
        let document = Html::parse_document(html);
        let paragraphs = GenericStrategy.extract(&document);
        assert_eq!(paragraphs.len(), 1);
        assert!(paragraphs[0].starts_with("بازداشت"));
    }

    #[test]
    fn test_first_container_with_content_wins() {
        let html = r#"<html><body>
            <article><p>Article container paragraph, long enough to be collected right away.</p></article>
            <main><p>Main container paragraph that loses to the article container always.</p></main>
        </body></html>"#;
        let document = Html::parse_document(html);
        let paragraphs = GenericStrategy.extract(&document);
        assert_eq!(paragraphs.len(), 1);
        assert!(paragraphs[0].starts_with("Article container"));
    }
}
