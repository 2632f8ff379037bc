//! # News Scout
//!
//! Finds recent news about a company and ranks each article by how strong a
//! business opportunity it signals for a consulting firm.
//!
//! ## Usage
//!
//! ```sh
//! export NEWSAPI_KEY=...
//! export OPENAI_API_KEY=...   # optional; heuristic scoring without it
//! news_scout https://www.snowflake.com -n 10
//! ```
//!
//! ## Architecture
//!
//! 1. **Subject**: a search term is used as-is; a URL is turned into a brand
//!    name from the page metadata
//! 2. **Search**: recent articles are fetched from NewsAPI
//! 3. **Processing**: per article, the page is fetched and its main text
//!    extracted, falling back to the provider's content; the text is then
//!    summarized and scored by the LLM or a heuristic
//! 4. **Output**: ranked JSON and CSV reports plus a per-run log file, written
//!    even when the run is interrupted with Ctrl+C

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};

mod cli;
mod config;
mod error;
mod extract;
mod fallback;
mod logging;
mod models;
mod oracle;
mod outputs;
mod pipeline;
mod progress;
mod repair;
mod scoring;
mod sources;
mod subject;
mod utils;

use cli::Cli;
use config::{Credentials, Settings};
use logging::LogSession;
use oracle::{Oracle, build_oracle};
use outputs::table::{DEFAULT_WIDTH, render_result_paths, render_table};
use outputs::{FileSink, OutputPaths};
use pipeline::Pipeline;
use progress::ProgressBar;
use sources::page::HttpFetcher;
use subject::{Method, is_valid_url, resolve_subject};
use utils::{ensure_writable_dir, file_stem, run_timestamp};

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init_console();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(query = %args.query, num_articles = args.num_articles, "Parsed CLI arguments");

    let settings = Settings::load(args.config.as_deref())?;
    let credentials = Credentials::new(args.openai_api_key.clone(), args.newsapi_key.clone());
    let width = terminal_width();
    println!("{}", "-".repeat(width));

    let oracle = build_oracle(&credentials, &settings);
    let oracle: Option<&dyn Oracle> = oracle.as_ref().map(|o| o as &dyn Oracle);
    let fetcher = HttpFetcher::new(&settings)?;

    // ---- Subject ----
    let spinner = is_valid_url(args.query.trim()).then(|| ProgressBar::spinner("Finding Brand Name"));
    let subject = resolve_subject(&args.query, &fetcher, oracle).await;
    if let Some(spinner) = spinner {
        spinner.finish();
    }
    match subject.method {
        Method::SearchTerm => println!(
            "Treating input as search term: '{}' (skipping brand name extraction)\n",
            subject.name
        ),
        Method::Oracle | Method::Heuristic => println!("Brand Name Found: {}\n", subject.name),
    }

    // ---- Outputs ----
    if let Err(e) = ensure_writable_dir(&args.results_dir).await {
        error!(
            path = %args.results_dir.display(),
            error = %e,
            "Results directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }
    let sink = FileSink::new(OutputPaths::new(
        &args.results_dir,
        &file_stem(&subject.name),
        &run_timestamp(Local::now()),
    ));
    let log_session = LogSession::open(&sink.paths().log)?;
    info!(
        query = %args.query,
        subject = %subject.name,
        confidence = subject.confidence,
        explanation = %subject.explanation,
        "Run started"
    );

    // ---- Source ----
    let source = match pipeline::open_source(&credentials, &settings, &sink).await {
        Ok(source) => source,
        Err(e) => {
            print_aborted(width, log_session.path(), &report_paths(&sink));
            return Err(e.into());
        }
    };

    // ---- Run ----
    let pipeline = Pipeline::new(
        &source,
        &fetcher,
        oracle,
        &subject.name,
        &settings.target_company,
    );
    let progress = ProgressBar::new("Processing articles", None);
    let result = pipeline
        .execute(
            usize::from(args.num_articles),
            &progress,
            &sink,
            shutdown_signal(),
        )
        .await;
    progress.finish();

    match result {
        Ok(summary) => {
            if summary.ranked.is_empty() {
                println!("No articles found.");
            } else {
                print!("{}", render_table(&summary.ranked, width));
            }
            print!("{}", render_result_paths(log_session.path(), &summary.written));
            info!(
                fetched = summary.fetched,
                scored = summary.ranked.len(),
                skipped = summary.skipped,
                elapsed_s = start_time.elapsed().as_secs_f64(),
                "Run finished"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Run ended early");
            print_aborted(width, log_session.path(), &report_paths(&sink));
            Err(e.into())
        }
    }
}

/// Resolves on Ctrl+C. If the handler cannot be installed the run simply
/// cannot be interrupted.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl+C");
        futures::future::pending::<()>().await;
    }
}

fn report_paths(sink: &FileSink) -> [PathBuf; 2] {
    [sink.paths().json.clone(), sink.paths().csv.clone()]
}

fn print_aborted(width: usize, log: &std::path::Path, written: &[PathBuf]) {
    println!("\n{}", "-".repeat(width));
    println!("\nAborting!\n");
    println!("[INFO] Partial results saved to:\n");
    print!("{}", render_result_paths(log, written));
}

/// `$COLUMNS` when set, otherwise a fixed default.
fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.trim().parse().ok())
        .filter(|&c: &usize| c > 0)
        .unwrap_or(DEFAULT_WIDTH)
}
