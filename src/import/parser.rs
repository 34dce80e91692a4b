use crate::models::{Memory, SavedMediaExport};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid export: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to read export: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse an export document into memories, preserving their order.
///
/// A single malformed record fails the whole import; callers never see a
/// partial list.
pub fn parse_export(bytes: &[u8]) -> Result<Vec<Memory>, ParseError> {
    let export: SavedMediaExport = serde_json::from_slice(bytes)?;
    let memories = export.saved_media;

    report_suspect_records(&memories);
    info!("Parsed {} memories from export", memories.len());

    Ok(memories)
}

/// Read an export from disk and parse it
pub async fn parse_export_file(path: &Path) -> Result<Vec<Memory>, ParseError> {
    let bytes = tokio::fs::read(path).await?;
    parse_export(&bytes)
}

/// Warn about records that will group oddly or shadow each other in the file index
fn report_suspect_records(memories: &[Memory]) {
    let unparseable = memories
        .iter()
        .filter(|memory| memory.timestamp().is_none())
        .count();
    if unparseable > 0 {
        warn!(
            "{} memories have dates outside the expected format; grouping may be off",
            unparseable
        );
    }

    let mut seen = HashSet::new();
    let duplicates = memories
        .iter()
        .filter(|memory| !seen.insert(memory.key()))
        .count();
    if duplicates > 0 {
        warn!(
            "{} memories share a date with an earlier one and will share its local file",
            duplicates
        );
    }
}
