//! Ranking and persistence of scored articles.
//!
//! # Submodules
//!
//! - [`json`]: writes the report as a JSON array of records
//! - [`csv`]: writes the same records as CSV rows
//! - [`table`]: renders the ranked report for the terminal
//!
//! # Output Structure
//!
//! ```text
//! results/
//! ├── acme_newsinsight_20250422-0930.json
//! ├── acme_newsinsight_20250422-0930.csv
//! └── acme_newsinsight_20250422-0930.logs.txt
//! ```
//!
//! Every persist ranks first, so partial reports written on interrupt carry
//! ranks just like complete ones.

use crate::error::ExportError;
use crate::models::ScoredArticle;
use async_trait::async_trait;
use itertools::Itertools;
use serde::Serialize;
use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use tracing::{error, instrument};

pub mod csv;
pub mod json;
pub mod table;

/// Sort by score, highest first, keeping input order among equal scores,
/// and assign 1-based ranks. Idempotent.
pub fn rank_articles(articles: Vec<ScoredArticle>) -> Vec<ScoredArticle> {
    articles
        .into_iter()
        .sorted_by_key(|article| Reverse(article.score))
        .enumerate()
        .map(|(idx, mut article)| {
            article.rank = Some(idx + 1);
            article
        })
        .collect()
}

/// Receives the final or partial list of scored articles of a run.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Rank and store `articles`, returning the files written.
    async fn persist(&self, articles: &[ScoredArticle]) -> Result<Vec<PathBuf>, ExportError>;
}

/// One exported record, in the fixed column order.
#[derive(Debug, Serialize)]
pub struct ExportRow<'a> {
    #[serde(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Score")]
    pub score: u8,
    #[serde(rename = "Publication Date")]
    pub published_at: &'a str,
    #[serde(rename = "Title")]
    pub title: &'a str,
    #[serde(rename = "Summary")]
    pub summary: &'a str,
    #[serde(rename = "Rationale")]
    pub rationale: &'a str,
    #[serde(rename = "URL")]
    pub url: &'a str,
}

impl<'a> From<&'a ScoredArticle> for ExportRow<'a> {
    fn from(article: &'a ScoredArticle) -> Self {
        ExportRow {
            rank: article.rank.unwrap_or_default(),
            score: article.score,
            published_at: &article.article.published_at,
            title: &article.article.title,
            summary: &article.summary,
            rationale: &article.rationale,
            url: &article.article.url,
        }
    }
}

/// The three files of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub log: PathBuf,
}

impl OutputPaths {
    /// `<dir>/<stem>_newsinsight_<timestamp>.{json,csv,logs.txt}`
    pub fn new(results_dir: &Path, stem: &str, timestamp: &str) -> Self {
        let base = format!("{stem}_newsinsight_{timestamp}");
        Self {
            json: results_dir.join(format!("{base}.json")),
            csv: results_dir.join(format!("{base}.csv")),
            log: results_dir.join(format!("{base}.logs.txt")),
        }
    }
}

/// Writes both the JSON and the CSV file for every persist.
#[derive(Debug, Clone)]
pub struct FileSink {
    paths: OutputPaths,
}

impl FileSink {
    pub fn new(paths: OutputPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }
}

#[async_trait]
impl ReportSink for FileSink {
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    async fn persist(&self, articles: &[ScoredArticle]) -> Result<Vec<PathBuf>, ExportError> {
        let ranked = rank_articles(articles.to_vec());
        let rows = ranked.iter().map(ExportRow::from).collect::<Vec<_>>();

        // Attempt both formats even if the first one fails.
        let json_result = json::write_records(&rows, &self.paths.json).await;
        let csv_result = csv::write_records(&rows, &self.paths.csv).await;
        if let Err(e) = &json_result {
            error!(error = %e, "Failed to write JSON results");
        }
        if let Err(e) = &csv_result {
            error!(error = %e, "Failed to write CSV results");
        }
        json_result?;
        csv_result?;
        Ok(vec![self.paths.json.clone(), self.paths.csv.clone()])
    }
}
