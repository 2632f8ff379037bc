//! Where articles and their pages come from.
//!
//! Both collaborators sit behind traits so the pipeline can run against test
//! doubles without network access:
//!
//! | Trait | Production type | Module |
//! |-------|-----------------|--------|
//! | [`ArticleSource`] | [`newsapi::NewsApiSource`] | [`newsapi`] |
//! | [`HtmlFetcher`] | [`page::HttpFetcher`] | [`page`] |
//!
//! A failing [`ArticleSource`] is fatal to the run. A failing [`HtmlFetcher`]
//! only means "no HTML" for that one article.

use crate::error::{FetchError, SourceError};
use crate::models::ProviderArticle;
use async_trait::async_trait;

pub mod newsapi;
pub mod page;

/// Searches for recent articles about a query.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// At most `limit` articles about `query`, in provider order.
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ProviderArticle>, SourceError>;

    /// Tag recorded in `fallback_used` when an article's text comes from this
    /// provider's own content instead of the article page.
    fn fallback_tag(&self) -> &'static str;
}

/// Downloads the raw HTML of a page.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}
