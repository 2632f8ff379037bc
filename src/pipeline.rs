//! Drives one run: search, fetch, resolve, score, persist.
//!
//! Articles are handled one at a time in provider order. Per-article
//! failures never end the run; they degrade to provider content, to the
//! heuristic scorer, or to a skipped article. The accumulator
//! ([`RunReport`]) is owned here and is always handed to the sink before
//! [`Pipeline::execute`] returns, whether the run completed, the source
//! failed, or the shutdown signal fired mid-article.

use crate::config::{Credentials, Settings};
use crate::error::{RunError, SourceError};
use crate::fallback::{Resolution, resolve};
use crate::models::{ProviderArticle, ScoredArticle};
use crate::oracle::Oracle;
use crate::outputs::{ReportSink, rank_articles};
use crate::progress::ProgressObserver;
use crate::scoring::Scorer;
use crate::sources::newsapi::NewsApiSource;
use crate::sources::{ArticleSource, HtmlFetcher};
use std::future::Future;
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

/// Everything completed so far in a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    /// Scored articles in processing order, unranked.
    pub scored: Vec<ScoredArticle>,
    /// Articles dropped because neither the page nor the provider had text.
    pub skipped: usize,
    /// Articles returned by the source.
    pub fetched: usize,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub fetched: usize,
    pub skipped: usize,
    /// Ranked, highest score first.
    pub ranked: Vec<ScoredArticle>,
    pub written: Vec<PathBuf>,
}

/// Build the NewsAPI source for a run.
///
/// A missing key or unusable client is run-fatal: the (empty) results are
/// still flushed through `sink` before the error is returned.
#[instrument(level = "info", skip_all)]
pub async fn open_source(
    credentials: &Credentials,
    settings: &Settings,
    sink: &dyn ReportSink,
) -> Result<NewsApiSource, RunError> {
    let source = credentials
        .newsapi_key()
        .and_then(|key| NewsApiSource::new(key, settings));
    match source {
        Ok(source) => Ok(source),
        Err(e) => {
            error!(error = %e, "Cannot create article source");
            if let Err(export) = sink.persist(&[]).await {
                error!(error = %export, "Failed to persist empty results");
            }
            Err(RunError::Config(e))
        }
    }
}

pub struct Pipeline<'a> {
    source: &'a dyn ArticleSource,
    fetcher: &'a dyn HtmlFetcher,
    scorer: Scorer<'a>,
    subject: &'a str,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn ArticleSource,
        fetcher: &'a dyn HtmlFetcher,
        oracle: Option<&'a dyn Oracle>,
        subject: &'a str,
        target_company: &'a str,
    ) -> Self {
        Self {
            source,
            fetcher,
            scorer: Scorer::new(oracle, target_company),
            subject,
        }
    }

    /// Fetch up to `limit` articles and process them into `report`.
    ///
    /// Only a source failure is an error. `report` holds every completed
    /// article at any await point, so dropping this future early loses at
    /// most the article in flight.
    #[instrument(level = "info", skip_all, fields(subject = %self.subject, limit))]
    pub async fn run(
        &self,
        limit: usize,
        progress: &dyn ProgressObserver,
        report: &mut RunReport,
    ) -> Result<(), SourceError> {
        let articles = self.source.fetch(self.subject, limit).await?;
        let total = articles.len();
        report.fetched = total;
        info!(total, oracle = self.scorer.has_oracle(), "Processing articles");
        progress.on_progress(0, total, report.skipped);

        for (idx, raw) in articles.iter().enumerate() {
            self.process(raw, report).await;
            progress.on_progress(idx + 1, total, report.skipped);
        }
        info!(
            scored = report.scored.len(),
            skipped = report.skipped,
            "Finished processing articles"
        );
        Ok(())
    }

    async fn process(&self, raw: &ProviderArticle, report: &mut RunReport) {
        let html = match self.fetcher.fetch_html(&raw.url).await {
            Ok(html) => Some(html),
            Err(e) => {
                warn!(url = %raw.url, error = %e, "Failed to fetch article page");
                None
            }
        };

        match resolve(raw, html.as_deref(), self.source.fallback_tag()) {
            Resolution::Dropped => report.skipped += 1,
            Resolution::Ready(article) => {
                let verdict = self.scorer.score(self.subject, &article.extracted_text).await;
                info!(url = %article.url, score = verdict.score, "Scored article");
                report.scored.push(ScoredArticle::new(article, verdict));
            }
        }
    }

    /// [`Self::run`] raced against `shutdown`, followed by an unconditional
    /// persist of whatever was completed.
    ///
    /// Returns [`RunError::Interrupted`] when `shutdown` fired first and
    /// [`RunError::Source`] when the search failed; both after the flush.
    pub async fn execute<F>(
        &self,
        limit: usize,
        progress: &dyn ProgressObserver,
        sink: &dyn ReportSink,
        shutdown: F,
    ) -> Result<RunSummary, RunError>
    where
        F: Future<Output = ()>,
    {
        let mut report = RunReport::default();
        let outcome = {
            let run = self.run(limit, progress, &mut report);
            tokio::select! {
                result = run => Some(result),
                _ = shutdown => None,
            }
        };

        let persisted = sink.persist(&report.scored).await;
        if let Err(e) = &persisted {
            error!(error = %e, "Failed to persist results");
        }

        match outcome {
            None => {
                warn!(
                    completed = report.scored.len(),
                    "Interrupted; partial results persisted"
                );
                persisted?;
                Err(RunError::Interrupted {
                    completed: report.scored.len(),
                })
            }
            Some(Err(e)) => {
                error!(error = %e, "Article source failed");
                Err(RunError::Source(e))
            }
            Some(Ok(())) => Ok(RunSummary {
                fetched: report.fetched,
                skipped: report.skipped,
                written: persisted?,
                ranked: rank_articles(report.scored),
            }),
        }
    }
}
