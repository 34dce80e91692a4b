use crate::models::Memory;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Maps a memory's key (its date string) to the downloaded file on disk.
///
/// Populated by a full scan in [`LocalFileIndex::refresh`] and by incremental
/// inserts as downloads complete. Two memories with the same date share one
/// entry; the later one wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalFileIndex {
    entries: HashMap<String, PathBuf>,
}

impl LocalFileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from scratch by checking each memory's expected path
    pub async fn refresh(&mut self, memories: &[Memory], storage_dir: &Path) {
        let mut entries = HashMap::new();

        for memory in memories {
            let path = memory.local_path(storage_dir);
            if fs::try_exists(&path).await.unwrap_or(false) {
                entries.insert(memory.key().to_string(), path);
            }
        }

        debug!(
            "LocalFileIndex: {} of {} memories present in {}",
            entries.len(),
            memories.len(),
            storage_dir.display()
        );
        self.entries = entries;
    }

    /// Record a file without touching disk
    pub fn insert(&mut self, key: &str, path: PathBuf) {
        self.entries.insert(key.to_string(), path);
    }

    pub fn lookup(&self, key: &str) -> Option<&Path> {
        self.entries.get(key).map(PathBuf::as_path)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(key, path)| (key.as_str(), path.as_path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_refresh_finds_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        let present = Memory::new("2024-03-15 10:00:00 UTC", "Image", "https://x/1");
        let missing = Memory::new("2024-03-16 10:00:00 UTC", "Video", "https://x/2");
        std::fs::write(temp_dir.path().join(present.file_name()), b"jpeg").unwrap();

        let mut index = LocalFileIndex::new();
        index
            .refresh(&[present.clone(), missing.clone()], temp_dir.path())
            .await;

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.lookup(present.key()),
            Some(temp_dir.path().join("2024-03-15_10-00-00_UTC.jpg").as_path())
        );
        assert!(index.lookup(missing.key()).is_none());
    }

    #[tokio::test]
    async fn test_refresh_drops_deleted_files() {
        let temp_dir = TempDir::new().unwrap();
        let memory = Memory::new("2024-03-15 10:00:00 UTC", "Image", "https://x/1");
        let path = memory.local_path(temp_dir.path());
        std::fs::write(&path, b"jpeg").unwrap();

        let mut index = LocalFileIndex::new();
        index.refresh(std::slice::from_ref(&memory), temp_dir.path()).await;
        assert!(index.contains(memory.key()));

        std::fs::remove_file(&path).unwrap();
        // Still indexed until the next full refresh
        assert!(index.contains(memory.key()));

        index.refresh(std::slice::from_ref(&memory), temp_dir.path()).await;
        assert!(index.is_empty());
    }

    #[test]
    fn test_insert_shadows_same_key() {
        let mut index = LocalFileIndex::new();
        index.insert("2024-03-15 10:00:00 UTC", PathBuf::from("/a.jpg"));
        index.insert("2024-03-15 10:00:00 UTC", PathBuf::from("/b.mp4"));

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.lookup("2024-03-15 10:00:00 UTC"),
            Some(Path::new("/b.mp4"))
        );
    }
}
