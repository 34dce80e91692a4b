mod handle;
mod tracker;

pub use handle::EventHandle;
pub use tracker::{BatchSummary, BatchTracker};

use crate::download::ItemStatus;
use crate::library::state::DownloadProgress;

/// Change notifications emitted by the library service
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryEvent {
    StatusChanged {
        message: String,
    },
    /// A successful import replaced the memory list and its sections
    MemoriesReplaced {
        count: usize,
    },
    DownloadStarted {
        total: usize,
    },
    ItemFinished {
        key: String,
        status: ItemStatus,
    },
    Progress(DownloadProgress),
    DownloadComplete(BatchSummary),
}
