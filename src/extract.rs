//! Main-text extraction from raw article HTML.
//!
//! Two strategies are tried in order and the first one that produces a
//! candidate wins:
//!
//! 1. **Article element**: the first `<article>` whose text is longer than
//!    [`PRIMARY_MIN_CHARS`].
//! 2. **Content container**: every `<div>`/`<section>` whose `id` or `class`
//!    contains one of `main`, `body`, `article`, `content`, `post`, `entry`
//!    (case-insensitive) and whose text is longer than
//!    [`CONTAINER_MIN_CHARS`]. The longest one wins; on equal length the
//!    first in document order is kept.
//!
//! If neither strategy finds a candidate the result is the empty string.
//! `html5ever` recovers from any malformed or truncated markup, so broken
//! input simply yields fewer (or no) candidates.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

/// Text length an `<article>` element must exceed to be accepted.
pub const PRIMARY_MIN_CHARS: usize = 100;

/// Text length a keyword-matched container must exceed to be a candidate.
pub const CONTAINER_MIN_CHARS: usize = 300;

/// Elements whose text never belongs to the article body.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

static ARTICLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article").expect("static selector"));
static CONTAINER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div, section").expect("static selector"));
static CONTAINER_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"main|body|article|content|post|entry").expect("static regex"));

static SPACE_BEFORE_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\n").expect("static regex"));
static SPACE_AFTER_NEWLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t\u{00A0}]+").expect("static regex"));
static REPEATED_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").expect("static regex"));
static REPEATED_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\u{00A0}]+").expect("static regex"));

/// Which extraction strategy produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ArticleElement,
    ContentContainer,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ArticleElement => "article_element",
            Strategy::ContentContainer => "content_container",
        }
    }
}

/// Cleaned article text and the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub strategy: Strategy,
}

/// Best-guess main article text of `html`, or `""` when nothing qualifies.
pub fn extract(html: &str) -> String {
    extract_with_strategy(html)
        .map(|extracted| extracted.text)
        .unwrap_or_default()
}

/// Like [`extract`] but reports which strategy won.
#[instrument(level = "debug", skip_all, fields(html_bytes = html.len()))]
pub fn extract_with_strategy(html: &str) -> Option<Extracted> {
    if html.trim().is_empty() {
        return None;
    }
    let document = Html::parse_document(html);

    if let Some(article) = document.select(&ARTICLE_SELECTOR).next() {
        let fragments = text_fragments(article);
        let chars = char_len(&fragments);
        if chars > PRIMARY_MIN_CHARS {
            debug!(chars, "Using <article> element");
            return Some(Extracted {
                text: clean_article_text(&fragments.join("\n")),
                strategy: Strategy::ArticleElement,
            });
        }
        debug!(chars, "Ignoring short <article> element");
    }

    let mut best: Option<(usize, Vec<&str>)> = None;
    for element in document.select(&CONTAINER_SELECTOR) {
        if !matches_container_keywords(element) {
            continue;
        }
        let fragments = text_fragments(element);
        let chars = char_len(&fragments);
        if chars <= CONTAINER_MIN_CHARS {
            continue;
        }
        // Strictly longer only, so the first of equal-length candidates stays.
        if best.as_ref().is_none_or(|(best_chars, _)| chars > *best_chars) {
            best = Some((chars, fragments));
        }
    }

    match best {
        Some((chars, fragments)) => {
            debug!(chars, "Using content container");
            Some(Extracted {
                text: clean_article_text(&fragments.join("\n")),
                strategy: Strategy::ContentContainer,
            })
        }
        None => {
            debug!("No suitable container found");
            None
        }
    }
}

/// Normalize whitespace of extracted text.
///
/// Trailing whitespace before a line break is dropped, blank lines are
/// collapsed, runs of spaces, tabs and non-breaking spaces become one space
/// and lines lose their leading indentation. Line-leading list markers
/// (`-`, `*`, `•`) stay on their own line exactly as written.
pub fn clean_article_text(text: &str) -> String {
    let text = SPACE_BEFORE_NEWLINE.replace_all(text, "\n");
    let text = REPEATED_NEWLINES.replace_all(&text, "\n");
    let text = REPEATED_SPACES.replace_all(&text, " ");
    let text = SPACE_AFTER_NEWLINE.replace_all(&text, "\n");
    text.trim().to_string()
}

/// Trimmed, non-empty text nodes under `element`, skipping script-like elements.
fn text_fragments(element: ElementRef<'_>) -> Vec<&str> {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            if SKIPPED_TAGS.contains(&parent.value().name()) {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        })
        .collect()
}

fn char_len(fragments: &[&str]) -> usize {
    fragments.iter().map(|f| f.chars().count()).sum()
}

fn matches_container_keywords(element: ElementRef<'_>) -> bool {
    let value = element.value();
    let mut identity = value.attr("id").unwrap_or_default().to_string();
    for class in value.classes() {
        identity.push(' ');
        identity.push_str(class);
    }
    CONTAINER_KEYWORDS.is_match(&identity.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAGRAPH: &str = "The quick brown fox jumps over the lazy dog. The sun was shining brightly in the clear blue sky. The birds were singing their sweet melodies, and the gentle breeze was rustling through the leaves of the trees. It was a beautiful day, full of hope and promise.";

    fn long_text() -> String {
        format!("{PARAGRAPH} {PARAGRAPH}")
    }

    #[test]
    fn test_article_element_extraction() {
        let html = format!(
            "<html><body><nav>Home | World</nav><article><h1>Headline</h1><p>This is the main article body.</p><p>{}</p></article></body></html>",
            long_text()
        );
        let extracted = extract_with_strategy(&html).unwrap();
        assert_eq!(extracted.strategy, Strategy::ArticleElement);
        assert!(extracted.text.contains("This is the main article body"));
        assert!(extracted.text.contains("quick brown fox"));
        assert!(!extracted.text.contains("Home | World"));
        assert!(extracted.text.starts_with("Headline\n"));
    }

    #[test]
    fn test_article_just_over_primary_threshold() {
        let body = "a".repeat(PRIMARY_MIN_CHARS + 1);
        let html = format!("<article><p>{body}</p></article>");
        assert_eq!(extract(&html), body);
    }

    #[test]
    fn test_short_article_falls_through_to_container() {
        let html = format!(
            "<article>Too short.</article><div class='main-content'><p>Main content goes here.</p><p>{}</p></div>",
            long_text()
        );
        let extracted = extract_with_strategy(&html).unwrap();
        assert_eq!(extracted.strategy, Strategy::ContentContainer);
        assert!(extracted.text.contains("Main content goes here"));
    }

    #[test]
    fn test_container_matched_by_id_case_insensitive() {
        let html = format!("<section id='PostBody'><p>{}</p></section>", long_text());
        let extracted = extract_with_strategy(&html).unwrap();
        assert_eq!(extracted.strategy, Strategy::ContentContainer);
        assert!(extracted.text.contains("gentle breeze"));
    }

    #[test]
    fn test_longest_container_wins() {
        let shorter = long_text();
        let longer = format!("{PARAGRAPH} LONGER {PARAGRAPH} {PARAGRAPH}");
        let html = format!(
            "<div class='entry'><p>{shorter}</p></div><div class='content'><p>{longer}</p></div>"
        );
        let text = extract(&html);
        assert!(text.contains("LONGER"));
    }

    #[test]
    fn test_equal_length_containers_keep_first() {
        let first = format!("FIRST {}", long_text());
        let second = format!("SECND {}", long_text());
        let html = format!("<div class='post'>{first}</div><div class='entry'>{second}</div>");
        assert!(extract(&html).starts_with("FIRST"));
    }

    #[test]
    fn test_unmatched_containers_are_ignored() {
        let html = format!("<div class='sidebar'><p>{}</p></div>", long_text());
        assert_eq!(extract(&html), "");
    }

    #[test]
    fn test_short_matching_container_is_ignored() {
        let html = "<div class='content'><p>Only a little text here.</p></div>";
        assert_eq!(extract(html), "");
    }

    #[test]
    fn test_no_container_found() {
        let html = "<html><head><title>Nothing</title></head><body><p>Hi</p></body></html>";
        assert_eq!(extract(html), "");
        assert_eq!(extract(""), "");
    }

    #[test]
    fn test_malformed_html_does_not_panic() {
        let truncated = format!("<html><body><article><p>{}", long_text());
        assert!(extract(&truncated).contains("quick brown fox"));
        assert_eq!(extract("<<<>>></div></section><article"), "");
    }

    #[test]
    fn test_script_text_is_skipped() {
        let html = format!(
            "<article><script>var tracking = 'x';</script><p>{}</p></article>",
            long_text()
        );
        assert!(!extract(&html).contains("tracking"));
    }

    #[test]
    fn test_clean_article_text_collapses_whitespace() {
        let raw = "First   line   \n\n\nSecond line \t\n  Third";
        assert_eq!(clean_article_text(raw), "First line\nSecond line\nThird");
    }

    #[test]
    fn test_clean_article_text_keeps_list_markers_on_their_line() {
        let raw = "Highlights:\n- First point\n*  Second point\n• Third point";
        assert_eq!(
            clean_article_text(raw),
            "Highlights:\n- First point\n* Second point\n• Third point"
        );
    }

    #[test]
    fn test_clean_article_text_leaves_line_leading_symbols_alone() {
        let raw = "Quarterly change:\n-5% in revenue\n*nix servers";
        assert_eq!(clean_article_text(raw), raw);
    }

    #[test]
    fn test_clean_article_text_collapses_non_breaking_spaces() {
        let raw = "Acme\u{00A0}\u{00A0}\u{00A0}Corp\n\u{00A0}\u{00A0}reported growth";
        assert_eq!(clean_article_text(raw), "Acme Corp\nreported growth");
    }
}
