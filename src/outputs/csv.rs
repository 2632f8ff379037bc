//! CSV report output. Same records and column order as the JSON report, with
//! a header row.

use super::ExportRow;
use crate::error::ExportError;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialize `rows` (header included) into a CSV document.
pub fn to_csv(rows: &[ExportRow<'_>]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        // serde only emits the header alongside the first record
        writer.write_record([
            "Rank",
            "Score",
            "Publication Date",
            "Title",
            "Summary",
            "Rationale",
            "URL",
        ])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))
}

/// Write `rows` to `path`, replacing any previous file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_records(rows: &[ExportRow<'_>], path: &Path) -> Result<(), ExportError> {
    let bytes = to_csv(rows)?;
    fs::write(path, bytes).await.map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(rows = rows.len(), "Wrote CSV results");
    Ok(())
}
