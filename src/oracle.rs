//! The language-model scoring oracle.
//!
//! The oracle is an opaque `prompt -> text` function behind the [`Oracle`]
//! trait so that scoring can be exercised with test doubles. The production
//! implementation, [`OpenAiOracle`], talks to any OpenAI-compatible chat
//! completions endpoint with the temperature pinned to zero.
//!
//! Calls are single-attempt: a failed call is reported to the caller, which
//! falls back to the heuristic summary instead of retrying.

use crate::config::{Credentials, Settings};
use crate::error::{ConfigError, OracleError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Sampling temperature for every oracle call.
pub const TEMPERATURE: f32 = 0.0;

/// A text-completion service.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Send `prompt` and return the raw response text.
    async fn call(&self, prompt: &str) -> Result<String, OracleError>;
}

/// [`Oracle`] backed by an OpenAI-compatible chat completions API.
pub struct OpenAiOracle {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiOracle {
    /// Build a client for `settings.oracle_url`. The client is reused for
    /// every call of the run.
    pub fn new(api_key: &str, settings: &Settings) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.oracle_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: settings.oracle_url.clone(),
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        })
    }
}

/// The oracle for this run, if one can be built. Without one, summaries and
/// scores come from the heuristics; this is never run-fatal.
pub fn build_oracle(credentials: &Credentials, settings: &Settings) -> Option<OpenAiOracle> {
    let Some(key) = credentials.openai_api_key() else {
        warn!("OPENAI_API_KEY not set; articles will be scored heuristically");
        return None;
    };
    match OpenAiOracle::new(key, settings) {
        Ok(oracle) => Some(oracle),
        Err(e) => {
            warn!(error = %e, "Cannot build oracle; articles will be scored heuristically");
            None
        }
    }
}

impl fmt::Debug for OpenAiOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiOracle")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn call(&self, prompt: &str) -> Result<String, OracleError> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Oracle call failed"
            );
            return Err(OracleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(OracleError::EmptyResponse)?;

        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            response_chars = content.chars().count(),
            "Oracle call succeeded"
        );
        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn settings_for(server: &mockito::ServerGuard) -> Settings {
        Settings {
            oracle_url: format!("{}/v1/chat/completions", server.url()),
            oracle_timeout_secs: 5,
            ..Settings::default()
        }
    }

    #[test]
    fn test_build_oracle_without_key_is_none() {
        let credentials = Credentials::new(None, Some("news-key".to_string()));
        assert!(build_oracle(&credentials, &Settings::default()).is_none());
    }

    #[test]
    fn test_build_oracle_with_key_uses_settings() {
        let credentials = Credentials::new(Some("sk-test".to_string()), None);
        let settings = Settings {
            model: "gpt-test".to_string(),
            ..Settings::default()
        };
        let oracle = build_oracle(&credentials, &settings).unwrap();
        assert_eq!(oracle.model, "gpt-test");
        assert_eq!(oracle.api_key, "sk-test");
    }

    #[tokio::test]
    async fn test_call_sends_deterministic_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4.1-nano",
                "temperature": 0.0,
                "messages": [{"role": "user", "content": "Score this"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant", "content": "  {\"score\": 10}\n"}}]}"#,
            )
            .create_async()
            .await;

        let oracle = OpenAiOracle::new("sk-test", &settings_for(&server)).unwrap();
        let response = oracle.call("Score this").await.unwrap();

        assert_eq!(response, r#"{"score": 10}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_reports_api_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"error": {"message": "Rate limit exceeded"}}"#)
            .create_async()
            .await;

        let oracle = OpenAiOracle::new("sk-test", &settings_for(&server)).unwrap();
        let err = oracle.call("Score this").await.unwrap_err();

        match err {
            OracleError::Api { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("Rate limit"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_without_choices_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let oracle = OpenAiOracle::new("sk-test", &settings_for(&server)).unwrap();
        assert!(matches!(
            oracle.call("x").await,
            Err(OracleError::EmptyResponse)
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let oracle = OpenAiOracle::new("sk-secret", &Settings::default()).unwrap();
        let debug = format!("{oracle:?}");
        assert!(!debug.contains("sk-secret"));
    }
}
