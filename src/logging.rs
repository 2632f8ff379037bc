//! Tracing setup.
//!
//! Two sinks share the same event stream:
//!
//! - the console (stderr), filtered by `RUST_LOG` and quiet (`warn`) by
//!   default so the progress bar stays readable
//! - the per-run log file next to the results, always at `info`, plain
//!   text with RFC 3339 UTC timestamps

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, fmt as tfmt};

fn console_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global console subscriber. Call once, first thing in `main`.
pub fn init_console() {
    tfmt()
        .with_env_filter(console_filter())
        .with_writer(io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(UtcTime::rfc_3339())
        .init();
}

/// Mirrors every `info`-or-above event of the current thread into a log
/// file until dropped. The console keeps receiving events as before.
pub struct LogSession {
    path: PathBuf,
    _guard: DefaultGuard,
}

impl LogSession {
    /// Create (or truncate) `path` and start logging into it.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        let file_layer = tfmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_timer(UtcTime::rfc_3339())
            .with_filter(LevelFilter::INFO);
        let console_layer = tfmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_timer(UtcTime::rfc_3339())
            .with_filter(console_filter());
        let subscriber = tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer);
        Ok(Self {
            path: path.to_path_buf(),
            _guard: tracing::subscriber::set_default(subscriber),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
