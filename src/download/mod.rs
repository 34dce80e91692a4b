// # Download Module
//
// - **Transport**: `MediaTransport` seam plus the reqwest-backed implementation
// - **Pipeline**: Per-item resolve-and-fetch and the bounded batch stream

mod pipeline;
mod transport;

pub use pipeline::{build_batch, resolve_and_fetch, ItemOutcome, ItemStatus};
pub use transport::{DownloadError, HttpTransport, MediaClient, MediaTransport};
