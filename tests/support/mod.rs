pub mod mock_transport;

pub use mock_transport::MockTransport;

use memfetch::{Config, LibraryHandle, LibraryService, MediaClient};
use std::path::Path;
use std::sync::Arc;

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Start a library service over `storage_dir` backed by the mock transport
pub fn start_library(storage_dir: &Path, transport: Arc<MockTransport>) -> LibraryHandle {
    start_library_with_width(storage_dir, transport, 5)
}

pub fn start_library_with_width(
    storage_dir: &Path,
    transport: Arc<MockTransport>,
    max_concurrent_downloads: usize,
) -> LibraryHandle {
    let config = Config::new(storage_dir.to_path_buf())
        .with_max_concurrent_downloads(max_concurrent_downloads);

    LibraryService::start(
        tokio::runtime::Handle::current(),
        config,
        MediaClient::from_transport(transport),
    )
}

/// Build an export document from `(date, media type, download link, direct url)` rows
pub fn export_json(records: &[(&str, &str, &str, Option<&str>)]) -> Vec<u8> {
    let saved_media: Vec<serde_json::Value> = records
        .iter()
        .map(|(date, media_type, link, direct)| {
            let mut record = serde_json::json!({
                "Date": date,
                "Media Type": media_type,
                "Download Link": link,
            });
            if let Some(direct) = direct {
                record["Media Download Url"] = serde_json::Value::from(*direct);
            }
            record
        })
        .collect();

    serde_json::to_vec(&serde_json::json!({ "Saved Media": saved_media })).unwrap()
}
