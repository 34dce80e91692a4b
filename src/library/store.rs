use crate::models::Memory;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Name of the state file inside the storage directory
pub const STATE_FILE_NAME: &str = "memories.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persists the full memory list as a flat JSON array.
///
/// The store is a best-effort cache of the last import: [`MemoryStore::load`]
/// falls back to an empty list and [`MemoryStore::save`] drops failed writes.
#[derive(Debug)]
pub struct MemoryStore {
    path: PathBuf,
    pending_save: Option<JoinHandle<()>>,
}

impl MemoryStore {
    pub fn new(storage_dir: &Path) -> Self {
        MemoryStore {
            path: storage_dir.join(STATE_FILE_NAME),
            pending_save: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved list, or an empty one if the file is missing or corrupt
    pub async fn load(&self) -> Vec<Memory> {
        match self.try_load().await {
            Ok(memories) => {
                info!(
                    "MemoryStore: Loaded {} memories from {}",
                    memories.len(),
                    self.path.display()
                );
                memories
            }
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("MemoryStore: No saved state at {}", self.path.display());
                Vec::new()
            }
            Err(e) => {
                warn!(
                    "MemoryStore: Ignoring unreadable state file {}: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    pub async fn try_load(&self) -> Result<Vec<Memory>, StoreError> {
        let bytes = fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Replace the saved list in the background.
    ///
    /// The list is serialized before returning, so later mutation by the caller
    /// can't leak into this write. Saves land in call order. Errors are logged
    /// and dropped.
    pub fn save(&mut self, memories: &[Memory]) {
        let serialized = serde_json::to_vec(memories);
        let path = self.path.clone();
        let previous = self.pending_save.take();

        self.pending_save = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }

            let result = match serialized {
                Ok(bytes) => write_atomically(&path, &bytes).await.map_err(StoreError::from),
                Err(e) => Err(StoreError::from(e)),
            };

            match result {
                Ok(()) => debug!("MemoryStore: Saved state to {}", path.display()),
                Err(e) => warn!("MemoryStore: Failed to save {}: {}", path.display(), e),
            }
        }));
    }

    /// Wait for any background save to land
    pub async fn flush(&mut self) {
        if let Some(pending) = self.pending_save.take() {
            let _ = pending.await;
        }
    }

    /// Replace the saved list, reporting failures to the caller
    pub async fn write(&self, memories: &[Memory]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(memories)?;
        write_atomically(&self.path, &bytes).await?;
        Ok(())
    }
}

/// Write to a sibling temp file, then rename over the destination
pub(crate) async fn write_atomically(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("download");
    let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    if let Err(e) = fs::write(&temp_path, data).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    Ok(())
}
