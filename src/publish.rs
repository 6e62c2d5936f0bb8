//! Publishing collaborator: the trait contract, the HTML body builder, and a
//! recording implementation that backs tests and dry runs.

use std::sync::Mutex;

use crate::error::Result;
use crate::models::{NewsItem, PostRef, ProcessedText};

/// Where accepted items go. Real backends (a blog API, a review channel)
/// implement this; the pipeline only sees the trait.
pub trait Publisher {
    async fn create_post(
        &self,
        title: &str,
        html: &str,
        labels: &[String],
        is_draft: bool,
    ) -> Result<PostRef>;
}

/// Captures every post instead of sending it anywhere. Doubles as the
/// dry-run backend.
#[derive(Default)]
pub struct RecordingPublisher {
    posts: Mutex<Vec<RecordedPost>>,
}

#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub title: String,
    pub html: String,
    pub labels: Vec<String>,
    pub is_draft: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.posts.lock().expect("posts lock").clone()
    }
}

impl Publisher for RecordingPublisher {
    async fn create_post(
        &self,
        title: &str,
        html: &str,
        labels: &[String],
        is_draft: bool,
    ) -> Result<PostRef> {
        let mut posts = self.posts.lock().expect("posts lock");
        posts.push(RecordedPost {
            title: title.to_string(),
            html: html.to_string(),
            labels: labels.to_vec(),
            is_draft,
        });
        let id = posts.len().to_string();
        Ok(PostRef {
            url: format!("recorded://post/{}", id),
            id,
        })
    }
}

/// Build the post body: image on top, the Persian text as an RTL block,
/// optional English/German sections, and a source attribution box.
pub fn build_post_html(item: &NewsItem, text: &ProcessedText, image: Option<&str>) -> String {
    let mut html = String::new();

    if let Some(image_url) = image.or(item.image_url.as_deref()) {
        html.push_str(&format!(
            "<div style=\"text-align:center;margin-bottom:20px;\"><img src=\"{}\" style=\"max-width:100%;height:auto;\" alt=\"{}\"/></div>\n",
            image_url,
            escape_html(&item.title)
        ));
    }

    html.push_str("<div dir=\"rtl\" style=\"text-align:right;font-size:16px;line-height:1.8;\">\n");
    for paragraph in text.persian.split("\n\n").filter(|p| !p.trim().is_empty()) {
        html.push_str(&format!("<p>{}</p>\n", escape_html(paragraph.trim())));
    }
    html.push_str("</div>\n");

    html = insert_jump_break(&html);

    if !text.english.is_empty() {
        html.push_str(&format!(
            "<div dir=\"ltr\" style=\"text-align:left;\"><h3>English</h3><p>{}</p></div>\n",
            escape_html(&text.english)
        ));
    }
    if !text.german.is_empty() {
        html.push_str(&format!(
            "<div dir=\"ltr\" style=\"text-align:left;\"><h3>Deutsch</h3><p>{}</p></div>\n",
            escape_html(&text.german)
        ));
    }

    html.push_str(&format!(
        "<div dir=\"rtl\" style=\"margin-top:20px;padding:10px;border-top:1px solid #ccc;font-size:13px;\">منبع: <a href=\"{}\">{}</a></div>\n",
        item.link,
        escape_html(&item.source_name)
    ));

    html
}

/// Blogger-style jump break after the first paragraph, so listings show only
/// the lead. When the body is one unbroken block, break at 300 characters.
pub fn insert_jump_break(html: &str) -> String {
    const BREAK: &str = "<!--more-->";
    if html.contains(BREAK) {
        return html.to_string();
    }
    if let Some(pos) = html.find("</p>") {
        let split = pos + "</p>".len();
        return format!("{}\n{}{}", &html[..split], BREAK, &html[split..]);
    }
    let prefix: String = html.chars().take(300).collect();
    if prefix.len() == html.len() {
        return html.to_string();
    }
    format!("{}{}{}", prefix, BREAK, &html[prefix.len()..])
}

/// Labels are keyed off the source: the international wire gets its own pair,
/// everything else is filed under the human-rights defaults.
pub fn labels_for_source(source_name: &str) -> Vec<String> {
    if source_name.contains("اینترنشنال") {
        vec!["گزارش ویژه".to_string(), "بین‌الملل".to_string()]
    } else {
        vec!["حقوق بشر".to_string(), "Iran".to_string()]
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item() -> NewsItem {
        NewsItem {
            id: "id".to_string(),
            title: "A headline".to_string(),
            link: "https://example.com/a".to_string(),
            description: "teaser".to_string(),
            source_name: "کانون دفاع از حقوق بشر در ایران".to_string(),
            source_category: "حقوق بشر".to_string(),
            language: "fa".to_string(),
            image_url: Some("https://example.com/listing.jpg".to_string()),
            published_at: None,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_post_html_structure() {
        let text = ProcessedText {
            persian: "بند اول خبر\n\nبند دوم خبر".to_string(),
            english: "English summary".to_string(),
            german: String::new(),
            tags: vec![],
        };
        let html = build_post_html(&item(), &text, Some("https://example.com/og.jpg"));

        // Extracted image beats the listing image.
        assert!(html.contains("https://example.com/og.jpg"));
        assert!(!html.contains("listing.jpg"));
        assert!(html.contains("dir=\"rtl\""));
        assert!(html.contains("<p>بند اول خبر</p>"));
        assert!(html.contains("<p>بند دوم خبر</p>"));
        assert!(html.contains("<!--more-->"));
        assert!(html.contains("English summary"));
        assert!(!html.contains("Deutsch"));
        assert!(html.contains("href=\"https://example.com/a\""));
    }

    #[test]
    fn test_listing_image_used_when_no_extracted_image() {
        let text = ProcessedText {
            persian: "متن".to_string(),
            ..ProcessedText::default()
        };
        let html = build_post_html(&item(), &text, None);
        assert!(html.contains("listing.jpg"));
    }

    #[test]
    fn test_jump_break_after_first_paragraph() {
        let html = "<p>first</p>\n<p>second</p>";
        let with_break = insert_jump_break(html);
        let break_pos = with_break.find("<!--more-->").unwrap();
        assert!(break_pos > with_break.find("first").unwrap());
        assert!(break_pos < with_break.find("second").unwrap());
    }

    #[test]
    fn test_jump_break_in_unbroken_block() {
        let html = "x".repeat(600);
        let with_break = insert_jump_break(&html);
        assert_eq!(with_break.find("<!--more-->"), Some(300));
    }

    #[test]
    fn test_jump_break_short_block_untouched() {
        assert_eq!(insert_jump_break("short"), "short");
    }

    #[test]
    fn test_labels_for_source() {
        assert_eq!(
            labels_for_source("ایران اینترنشنال"),
            vec!["گزارش ویژه", "بین‌الملل"]
        );
        assert_eq!(
            labels_for_source("کانون دفاع از حقوق بشر در ایران"),
            vec!["حقوق بشر", "Iran"]
        );
    }

    #[test]
    fn test_html_escaped_in_title_and_text() {
        let mut item = item();
        item.title = "a <b> & \"c\"".to_string();
        let text = ProcessedText {
            persian: "<script>alert(1)</script>".to_string(),
            ..ProcessedText::default()
        };
        let html = build_post_html(&item, &text, None);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_recording_publisher_captures_posts() {
        let publisher = RecordingPublisher::new();
        let labels = labels_for_source("x");
        let post = publisher
            .create_post("Title", "<p>body</p>", &labels, false)
            .await
            .unwrap();
        assert_eq!(post.id, "1");
        let posts = publisher.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Title");
        assert!(!posts[0].is_draft);
    }
}
