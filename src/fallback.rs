//! Decides which text an article is scored on.
//!
//! The fetched page is preferred. When the fetch failed, the page was empty,
//! or extraction produced fewer than [`MIN_USABLE_CHARS`] characters, the
//! provider's own `content`/`description` is used instead and the article is
//! tagged with the provider's fallback tag. An article with no text left
//! after both attempts is dropped.

use crate::extract::extract_with_strategy;
use crate::models::{Article, ProviderArticle};
use crate::utils::truncate_for_log;
use tracing::info;

/// Extracted text shorter than this is rejected in favour of provider content.
pub const MIN_USABLE_CHARS: usize = 100;

/// Outcome of resolving one article's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Ready(Article),
    /// Neither the page nor the provider yielded any text.
    Dropped,
}

/// Resolve the text for `raw` from its fetched page (`None` when the fetch
/// failed) and the provider's short content.
pub fn resolve(raw: &ProviderArticle, html: Option<&str>, fallback_tag: &str) -> Resolution {
    let reason = match html.map(str::trim).filter(|h| !h.is_empty()) {
        None => "no_html",
        Some(html) => match extract_with_strategy(html) {
            Some(extracted) if extracted.text.chars().count() >= MIN_USABLE_CHARS => {
                info!(
                    url = %raw.url,
                    strategy = extracted.strategy.as_str(),
                    chars = extracted.text.chars().count(),
                    preview = %truncate_for_log(&extracted.text, 300),
                    "Extracted article text from page"
                );
                return Resolution::Ready(Article::new(raw, extracted.text, None));
            }
            Some(_) => "extraction_too_short",
            None => "no_container",
        },
    };

    let text = raw.provider_text();
    if text.is_empty() {
        info!(
            url = %raw.url,
            title = %raw.title,
            reason,
            "Skipping article: page and provider content are both empty"
        );
        return Resolution::Dropped;
    }

    info!(
        url = %raw.url,
        title = %raw.title,
        reason,
        fallback = fallback_tag,
        chars = text.chars().count(),
        "Using provider content fallback"
    );
    Resolution::Ready(Article::new(raw, text.to_string(), Some(fallback_tag.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &str = "provider_content";

    fn raw(content: Option<&str>, description: Option<&str>) -> ProviderArticle {
        ProviderArticle {
            title: "Title One".to_string(),
            source: "SourceA".to_string(),
            published_at: "2025-04-21T10:00:00Z".to_string(),
            url: "http://example.com/one".to_string(),
            content: content.map(str::to_string),
            description: description.map(str::to_string),
        }
    }

    fn article_html() -> String {
        format!("<html><body><article>{}</article></body></html>", "The quick brown fox jumps over the lazy dog. ".repeat(5))
    }

    fn ready(resolution: Resolution) -> Article {
        match resolution {
            Resolution::Ready(article) => article,
            Resolution::Dropped => panic!("article was dropped"),
        }
    }

    #[test]
    fn test_page_text_used_when_long_enough() {
        let article = ready(resolve(&raw(Some("Short summary one."), None), Some(&article_html()), TAG));
        assert!(article.extracted_text.contains("quick brown fox"));
        assert_eq!(article.fallback_used, None);
    }

    #[test]
    fn test_fetch_failure_uses_provider_content() {
        let article = ready(resolve(&raw(Some("Short summary one."), None), None, TAG));
        assert_eq!(article.extracted_text, "Short summary one.");
        assert_eq!(article.fallback_used.as_deref(), Some(TAG));
    }

    #[test]
    fn test_empty_html_uses_description() {
        let article = ready(resolve(&raw(None, Some("Short summary two.")), Some("   "), TAG));
        assert_eq!(article.extracted_text, "Short summary two.");
        assert_eq!(article.fallback_used.as_deref(), Some(TAG));
    }

    #[test]
    fn test_short_extraction_falls_back() {
        let html = "<div class='content'>Paywalled. Subscribe to continue.</div>";
        let article = ready(resolve(&raw(Some("Provider text."), None), Some(html), TAG));
        assert_eq!(article.extracted_text, "Provider text.");
        assert_eq!(article.fallback_used.as_deref(), Some(TAG));
    }

    #[test]
    fn test_dropped_when_everything_is_empty() {
        assert_eq!(resolve(&raw(None, None), None, TAG), Resolution::Dropped);
        assert_eq!(resolve(&raw(Some(""), Some("  ")), Some("<p>x</p>"), TAG), Resolution::Dropped);
    }

    #[test]
    fn test_provider_metadata_is_carried_over() {
        let article = ready(resolve(&raw(Some("c"), None), None, TAG));
        assert_eq!(article.title, "Title One");
        assert_eq!(article.source, "SourceA");
        assert_eq!(article.published_at, "2025-04-21T10:00:00Z");
        assert_eq!(article.url, "http://example.com/one");
    }
}
