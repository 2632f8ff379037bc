//! Error types for each collaborator seam of the pipeline.
//!
//! Only [`RunError`] ever ends a run. Every other error is recovered per
//! article by the caller (fetch failures fall back to provider content,
//! oracle failures fall back to the heuristic summary) and only logged.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-level failures, detected before any article is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing required credential: {0}")]
    MissingCredential(&'static str),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// A single page could not be fetched. Always recovered by the fallback resolver.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no URL to fetch")]
    EmptyUrl,

    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// The article provider failed. Fatal to the run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },
}

/// The scoring oracle could not be reached or answered without content.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request timed out")]
    Timeout,

    #[error("oracle transport error: {0}")]
    Network(String),

    #[error("oracle API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("oracle response has no choices")]
    EmptyResponse,
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OracleError::Timeout
        } else {
            OracleError::Network(err.to_string())
        }
    }
}

/// Writing results to disk failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors that end a run early. Partial results are persisted before any of
/// these reaches `main`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("article source failed: {0}")]
    Source(#[from] SourceError),

    #[error("failed to persist results: {0}")]
    Export(#[from] ExportError),

    #[error("interrupted after {completed} article(s)")]
    Interrupted { completed: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_error_wraps_config_error() {
        let err: RunError = ConfigError::MissingCredential("NEWSAPI_KEY").into();
        assert_eq!(
            err.to_string(),
            "configuration error: missing required credential: NEWSAPI_KEY"
        );
    }

    #[test]
    fn test_interrupted_message_counts_completed() {
        let err = RunError::Interrupted { completed: 3 };
        assert_eq!(err.to_string(), "interrupted after 3 article(s)");
    }

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(FetchError::Status(404).to_string(), "HTTP status 404");
        assert_eq!(FetchError::EmptyUrl.to_string(), "no URL to fetch");
    }
}
