//! Run settings and credentials.
//!
//! Settings come from an optional YAML file; every key is optional and falls
//! back to the defaults below. Credentials come from the CLI/environment
//! (see [`crate::cli::Cli`]).
//!
//! ```yaml
//! target_company: Red Pepper Software
//! model: gpt-4.1-nano
//! page_timeout_secs: 6
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Company the business-opportunity rubric is written for.
    pub target_company: String,
    pub model: String,
    /// OpenAI-compatible chat completions endpoint.
    pub oracle_url: String,
    pub max_tokens: u32,
    pub oracle_timeout_secs: u64,
    pub page_timeout_secs: u64,
    pub source_timeout_secs: u64,
    pub newsapi_url: String,
    /// How far back the article search reaches.
    pub lookback_days: i64,
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_company: "Red Pepper Software".to_string(),
            model: "gpt-4.1-nano".to_string(),
            oracle_url: "https://api.openai.com/v1/chat/completions".to_string(),
            max_tokens: 4096,
            oracle_timeout_secs: 30,
            page_timeout_secs: 6,
            source_timeout_secs: 15,
            newsapi_url: "https://newsapi.org/v2/everything".to_string(),
            lookback_days: 30,
            language: "en".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or the defaults when no path is given.
    #[instrument(level = "info", skip_all)]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), model = %settings.model, "Loaded settings");
        Ok(settings)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

/// API keys for the article provider and the oracle. Blank values count as
/// absent.
#[derive(Clone, Default)]
pub struct Credentials {
    openai_api_key: Option<String>,
    newsapi_key: Option<String>,
}

impl Credentials {
    pub fn new(openai_api_key: Option<String>, newsapi_key: Option<String>) -> Self {
        let present = |key: Option<String>| key.filter(|k| !k.trim().is_empty());
        Self {
            openai_api_key: present(openai_api_key),
            newsapi_key: present(newsapi_key),
        }
    }

    /// The article provider key. Required for a run.
    pub fn newsapi_key(&self) -> Result<&str, ConfigError> {
        self.newsapi_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential("NEWSAPI_KEY"))
    }

    /// The oracle key. Without it every article is scored heuristically.
    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai_api_key.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("newsapi_key", &redact(&self.newsapi_key))
            .finish()
    }
}
