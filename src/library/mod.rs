// # Library Module
//
// Everything the gallery reads, owned by one service task:
//
// - **Sections**: Year → month grouping, rebuilt on every change
// - **LocalFileIndex**: Memory key → downloaded file
// - **MemoryStore**: JSON state file that survives restarts
// - **LibraryService**: Owns `LibraryState`, runs imports and download batches
// - **LibraryHandle**: Send requests and subscribe to `LibraryEvent`s

mod file_index;
mod handle;
mod progress;
mod sections;
mod service;
mod state;
mod store;

pub use file_index::LocalFileIndex;
pub use handle::{ImportSource, LibraryError, LibraryHandle};
pub use progress::{BatchSummary, LibraryEvent};
pub use sections::{build_sections, MonthSection, YearSection};
pub use service::LibraryService;
pub use state::{DownloadProgress, LibraryState};
pub use store::{MemoryStore, StoreError, STATE_FILE_NAME};

pub(crate) use store::write_atomically;
