//! JSON report output.
//!
//! The report is a pretty-printed array of [`ExportRow`] records in rank
//! order:
//!
//! ```json
//! [
//!   {
//!     "Rank": 1,
//!     "Score": 85,
//!     "Publication Date": "2025-04-21T10:00:00Z",
//!     "Title": "Company X Launches Product",
//!     "Summary": "...",
//!     "Rationale": "...",
//!     "URL": "https://example.com/x"
//!   }
//! ]
//! ```

use super::ExportRow;
use crate::error::ExportError;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write `rows` to `path`, replacing any previous file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_records(rows: &[ExportRow<'_>], path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(rows)?;
    fs::write(path, json).await.map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(rows = rows.len(), "Wrote JSON results");
    Ok(())
}
