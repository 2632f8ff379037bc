//! Terminal rendering of a ranked report and of the files a run wrote.

use crate::models::ScoredArticle;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Width used when the terminal size cannot be determined.
pub const DEFAULT_WIDTH: usize = 120;

/// Render `articles` (already ranked) as one block per article, each block
/// preceded by a rule of `width` dashes, with a closing rule at the end.
pub fn render_table(articles: &[ScoredArticle], width: usize) -> String {
    let rule = "-".repeat(width);
    let mut out = String::new();
    for article in articles {
        let rank = article
            .rank
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Rank: {rank}");
        let _ = writeln!(out, "Score: {}\n", article.score);
        let _ = writeln!(out, "Publication Date: {}\n", article.article.published_at);
        let _ = writeln!(out, "Title: {}\n", article.article.title);
        let _ = writeln!(out, "Summary: {}\n", article.summary);
        let _ = writeln!(out, "Rationale: {}\n", article.rationale);
        let _ = writeln!(out, "URL: {}", article.article.url);
    }
    let _ = writeln!(out, "{rule}");
    out
}

/// Paths of the log file and of the written result files, made absolute.
pub fn render_result_paths(log: &Path, written: &[PathBuf]) -> String {
    let mut out = format!("Full logs:\n{}\n", absolute(log).display());
    for path in written {
        let label = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => "JSON Results",
            Some("csv") => "CSV Results",
            _ => "Results",
        };
        let _ = write!(out, "\n{label}:\n{}\n", absolute(path).display());
    }
    out
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
