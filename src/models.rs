//! Data models for articles as they move through the pipeline.
//!
//! - [`ProviderArticle`]: raw record returned by the article source
//! - [`Article`]: provider record plus the text the scoring stage will read
//! - [`Verdict`]: summary, score and rationale produced for one article
//! - [`ScoredArticle`]: an [`Article`] with its [`Verdict`] and, once
//!   ranked, its position in the report

use serde::{Deserialize, Serialize};

/// An article as returned by the provider, before any page fetch.
///
/// `content` and `description` are the provider's own short texts; they are
/// the guaranteed (if weaker) fallback when the article page is unusable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderArticle {
    pub title: String,
    pub source: String,
    pub published_at: String,
    pub url: String,
    pub content: Option<String>,
    pub description: Option<String>,
}

impl ProviderArticle {
    /// The provider's best short text: `content`, else `description`, else `""`.
    pub fn provider_text(&self) -> &str {
        [self.content.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }
}

/// An article ready for scoring.
///
/// `extracted_text` is never empty for an `Article` that reaches the scoring
/// stage; empty text means the article was dropped. `fallback_used` is set
/// exactly when the page extraction was rejected and names the fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    pub title: String,
    pub source: String,
    pub published_at: String,
    pub url: String,
    pub extracted_text: String,
    pub fallback_used: Option<String>,
}

impl Article {
    pub fn new(raw: &ProviderArticle, extracted_text: String, fallback_used: Option<String>) -> Self {
        Self {
            title: raw.title.clone(),
            source: raw.source.clone(),
            published_at: raw.published_at.clone(),
            url: raw.url.clone(),
            extracted_text,
            fallback_used,
        }
    }
}

/// The scoring result for a single article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Verdict {
    /// At most 500 characters.
    pub summary: String,
    /// 0..=100; 0 means no signal or a failed oracle.
    pub score: u8,
    pub rationale: String,
}

/// An [`Article`] with its [`Verdict`].
///
/// `rank` stays `None` during scoring and is only filled in by
/// [`crate::outputs::rank_articles`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub article: Article,
    pub summary: String,
    pub score: u8,
    pub rationale: String,
    pub rank: Option<usize>,
}

impl ScoredArticle {
    pub fn new(article: Article, verdict: Verdict) -> Self {
        Self {
            article,
            summary: verdict.summary,
            score: verdict.score,
            rationale: verdict.rationale,
            rank: None,
        }
    }
}
