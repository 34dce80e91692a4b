use crate::library::file_index::LocalFileIndex;
use crate::library::sections::YearSection;
use crate::models::Memory;

pub const STATUS_IDLE: &str = "Import JSON to start";
pub const STATUS_PROCESSING: &str = "Processing...";
pub const STATUS_DOWNLOADING: &str = "Downloading...";
pub const STATUS_DOWNLOAD_COMPLETE: &str = "Download Complete!";

pub fn imported_status(count: usize) -> String {
    format!("Imported {} memories. Ready to download.", count)
}

pub fn error_status(error: &impl std::fmt::Display) -> String {
    format!("Error: {}", error)
}

/// Completed items out of the current batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadProgress {
    pub completed: usize,
    pub total: usize,
}

impl DownloadProgress {
    /// Fraction in `0.0..=1.0`; an empty batch counts as done
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.completed as f64 / self.total as f64).min(1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }
}

/// Everything a gallery view reads.
///
/// Owned and mutated only by the library service task; consumers get clones
/// through [`crate::library::LibraryHandle::snapshot`] and change notifications
/// through event subscriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryState {
    pub all_memories: Vec<Memory>,
    pub sections: Vec<YearSection>,
    pub downloaded_files: LocalFileIndex,
    pub progress: DownloadProgress,
    pub is_downloading: bool,
    pub is_processing: bool,
    pub status_message: String,
}

impl Default for LibraryState {
    fn default() -> Self {
        LibraryState {
            all_memories: Vec::new(),
            sections: Vec::new(),
            downloaded_files: LocalFileIndex::new(),
            progress: DownloadProgress::default(),
            is_downloading: false,
            is_processing: false,
            status_message: STATUS_IDLE.to_string(),
        }
    }
}
