//! NewsAPI.org article search.
//!
//! Uses the `/v2/everything` endpoint, newest first, restricted to the last
//! `lookback_days` days and one language. The provider's `content` and
//! `description` fields are kept as the fallback text for each article.

use super::ArticleSource;
use crate::config::Settings;
use crate::error::{ConfigError, SourceError};
use crate::models::ProviderArticle;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration as StdDuration;
use tracing::{info, instrument, warn};

/// Largest page size the endpoint accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// Fallback tag for articles scored on NewsAPI's own content.
pub const FALLBACK_TAG: &str = "newsapi_content";

pub struct NewsApiSource {
    client: Client,
    url: String,
    api_key: String,
    language: String,
    lookback_days: i64,
}

impl NewsApiSource {
    pub fn new(api_key: &str, settings: &Settings) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(settings.source_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: settings.newsapi_url.clone(),
            api_key: api_key.to_string(),
            language: settings.language.clone(),
            lookback_days: settings.lookback_days,
        })
    }
}

impl fmt::Debug for NewsApiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiSource")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("language", &self.language)
            .field("lookback_days", &self.lookback_days)
            .finish()
    }
}

#[async_trait]
impl ArticleSource for NewsApiSource {
    #[instrument(level = "info", skip_all, fields(%query, limit))]
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ProviderArticle>, SourceError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let to = Utc::now().date_naive();
        let from = (to - Duration::days(self.lookback_days)).to_string();
        let to = to.to_string();
        let page_size = limit.to_string();

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("q", query),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("language", self.language.as_str()),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<NewsApiResponse>(&body)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or(body);
            warn!(status = status.as_u16(), %message, "NewsAPI request failed");
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: NewsApiResponse = response.json().await?;
        if body.status == "error" {
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body.message.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        let articles = body
            .articles
            .into_iter()
            .take(limit)
            .map(ProviderArticle::from)
            .collect::<Vec<_>>();
        info!(count = articles.len(), "Fetched articles from NewsAPI");
        Ok(articles)
    }

    fn fallback_tag(&self) -> &'static str {
        FALLBACK_TAG
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    source: Option<NewsApiSourceRef>,
    published_at: Option<String>,
    url: Option<String>,
    content: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSourceRef {
    name: Option<String>,
}

impl From<NewsApiArticle> for ProviderArticle {
    fn from(a: NewsApiArticle) -> Self {
        ProviderArticle {
            title: a.title.unwrap_or_default(),
            source: a.source.and_then(|s| s.name).unwrap_or_default(),
            published_at: a.published_at.unwrap_or_default(),
            url: a.url.unwrap_or_default(),
            content: a.content,
            description: a.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const RESPONSE: &str = r#"{
        "status": "ok",
        "totalResults": 2,
        "articles": [
            {
                "title": "Title One",
                "source": {"id": null, "name": "SourceA"},
                "publishedAt": "2025-04-21T10:00:00Z",
                "url": "http://example.com/one",
                "content": "Short summary one."
            },
            {
                "title": "Title Two",
                "source": {"name": "SourceB"},
                "publishedAt": "2025-04-21T12:00:00Z",
                "url": "http://example.com/two",
                "description": "Short summary two.",
                "content": null
            }
        ]
    }"#;

    fn settings_for(server: &mockito::ServerGuard) -> Settings {
        Settings {
            newsapi_url: format!("{}/v2/everything", server.url()),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_maps_articles() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/everything")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "Snowflake".into()),
                Matcher::UrlEncoded("pageSize".into(), "25".into()),
                Matcher::UrlEncoded("sortBy".into(), "publishedAt".into()),
                Matcher::UrlEncoded("language".into(), "en".into()),
                Matcher::UrlEncoded("apiKey".into(), "news-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(RESPONSE)
            .create_async()
            .await;

        let source = NewsApiSource::new("news-key", &settings_for(&server)).unwrap();
        let articles = source.fetch("Snowflake", 25).await.unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Title One");
        assert_eq!(articles[0].source, "SourceA");
        assert_eq!(articles[0].provider_text(), "Short summary one.");
        assert_eq!(articles[1].published_at, "2025-04-21T12:00:00Z");
        assert_eq!(articles[1].provider_text(), "Short summary two.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_caps_page_size() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/everything")
            .match_query(Matcher::UrlEncoded("pageSize".into(), "100".into()))
            .with_status(200)
            .with_body(r#"{"status": "ok", "articles": []}"#)
            .create_async()
            .await;

        let source = NewsApiSource::new("news-key", &settings_for(&server)).unwrap();
        assert!(source.fetch("bitcoin", 500).await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v2/everything")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."}"#)
            .create_async()
            .await;

        let source = NewsApiSource::new("bad-key", &settings_for(&server)).unwrap();
        match source.fetch("Snowflake", 10).await.unwrap_err() {
            SourceError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Your API key is invalid.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fallback_tag() {
        let source = NewsApiSource::new("k", &Settings::default()).unwrap();
        assert_eq!(source.fallback_tag(), "newsapi_content");
    }
}
