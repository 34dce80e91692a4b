// Download Pipeline
//
// One batch = every memory in the library, each run through resolve-and-fetch:
//
// - Existing file at the deterministic path: done, no network
// - Direct URL present: GET it
// - Otherwise: POST the download link, GET the URL it answers with
//
// Items flow through `buffer_unordered`, so at most `max_in_flight` are
// working at once and a finished slot is refilled immediately. Workers only
// return outcomes; the library service applies them to shared state.

use crate::download::transport::{DownloadError, MediaClient};
use crate::library::write_atomically;
use crate::models::Memory;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Url;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Result of processing one memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    /// File was already on disk, nothing fetched
    AlreadyPresent(PathBuf),
    Downloaded(PathBuf),
    Failed,
}

impl ItemStatus {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ItemStatus::AlreadyPresent(path) | ItemStatus::Downloaded(path) => Some(path),
            ItemStatus::Failed => None,
        }
    }
}

/// What a worker hands back to the owning task
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub key: String,
    pub status: ItemStatus,
}

/// Build the batch stream over an owned snapshot of the memory list.
///
/// The caller drives the stream; nothing runs until it is polled.
pub fn build_batch(
    memories: Vec<Memory>,
    storage_dir: PathBuf,
    client: MediaClient,
    max_in_flight: usize,
) -> BoxStream<'static, ItemOutcome> {
    stream::iter(memories)
        .map(move |memory| {
            let client = client.clone();
            let storage_dir = storage_dir.clone();
            async move {
                let status = match resolve_and_fetch(&memory, &storage_dir, &client).await {
                    Ok(status) => status,
                    Err(e) => {
                        warn!("Download failed for {}: {}", memory.key(), e);
                        ItemStatus::Failed
                    }
                };
                ItemOutcome {
                    key: memory.key().to_string(),
                    status,
                }
            }
        })
        .buffer_unordered(max_in_flight.max(1))
        .boxed()
}

/// Ensure one memory's media is on disk
pub async fn resolve_and_fetch(
    memory: &Memory,
    storage_dir: &Path,
    client: &MediaClient,
) -> Result<ItemStatus, DownloadError> {
    let path = memory.local_path(storage_dir);

    if fs::try_exists(&path).await.unwrap_or(false) {
        debug!("Skipping {}, already at {}", memory.key(), path.display());
        return Ok(ItemStatus::AlreadyPresent(path));
    }

    let media_url = media_url_for(memory, client).await?;
    let data = client.fetch(&media_url).await?;
    write_atomically(&path, &data).await?;

    debug!(
        "Downloaded {} ({} bytes) to {}",
        memory.key(),
        data.len(),
        path.display()
    );
    Ok(ItemStatus::Downloaded(path))
}

/// Direct URL when the export has a usable one, else resolve the download link
async fn media_url_for(memory: &Memory, client: &MediaClient) -> Result<Url, DownloadError> {
    if let Some(direct) = memory.direct_url() {
        return Ok(direct);
    }

    let download_link = memory
        .download_link_url()
        .ok_or_else(|| DownloadError::InvalidUrl(memory.download_link.clone()))?;

    client.resolve_media_url(&download_link).await
}
