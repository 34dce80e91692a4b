use crate::download::ItemStatus;
use crate::library::state::DownloadProgress;
use tracing::trace;

/// Outcome counts for a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub downloaded: usize,
    pub already_present: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn completed(&self) -> usize {
        self.downloaded + self.already_present + self.failed
    }
}

/// Tracks completion of one download batch.
///
/// Every finished item counts toward progress whether it succeeded or not.
/// Items finish in any order, so only the counts are tracked.
#[derive(Debug, Clone)]
pub struct BatchTracker {
    total: usize,
    summary: BatchSummary,
}

impl BatchTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            summary: BatchSummary::default(),
        }
    }

    /// Record one finished item and return the updated progress
    pub fn on_item_finished(&mut self, status: &ItemStatus) -> DownloadProgress {
        match status {
            ItemStatus::Downloaded(_) => self.summary.downloaded += 1,
            ItemStatus::AlreadyPresent(_) => self.summary.already_present += 1,
            ItemStatus::Failed => self.summary.failed += 1,
        }

        let progress = self.progress();
        trace!(
            "Item complete ({}/{}), {}% done",
            progress.completed,
            progress.total,
            calculate_percent(progress.completed, progress.total)
        );
        progress
    }

    pub fn progress(&self) -> DownloadProgress {
        DownloadProgress {
            completed: self.summary.completed(),
            total: self.total,
        }
    }

    pub fn summary(&self) -> BatchSummary {
        self.summary
    }
}

/// Calculate progress percentage
pub fn calculate_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        100
    } else {
        ((completed as f64 / total as f64) * 100.0).min(100.0) as u8
    }
}
