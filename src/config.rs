use std::path::PathBuf;
use tracing::{debug, info};

/// Default number of concurrent downloads
pub const DEFAULT_MAX_DOWNLOADS: usize = 5;

/// Application configuration
/// Loads from environment variables, after reading a .env file if present
#[derive(Clone, Debug)]
pub struct Config {
    /// Flat directory holding the state file and downloaded media
    pub storage_dir: PathBuf,
    /// Width of the download worker pool
    pub max_concurrent_downloads: usize,
}

impl Config {
    /// Load configuration from the environment
    pub fn load() -> Self {
        if dotenvy::dotenv().is_ok() {
            debug!("Config: Loaded .env file");
        }

        Self::from_env()
    }

    /// Load configuration from environment variables
    ///
    /// - `MEMFETCH_STORAGE_PATH`: storage directory
    /// - `MEMFETCH_MAX_DOWNLOADS`: concurrent downloads (at least 1)
    fn from_env() -> Self {
        let storage_dir = std::env::var("MEMFETCH_STORAGE_PATH")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(default_storage_dir);

        let max_concurrent_downloads = std::env::var("MEMFETCH_MAX_DOWNLOADS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_DOWNLOADS);

        let config = Self::new(storage_dir).with_max_concurrent_downloads(max_concurrent_downloads);
        info!(
            "Config: Storage at {} with {} concurrent downloads",
            config.storage_dir.display(),
            config.max_concurrent_downloads
        );
        config
    }

    pub fn new(storage_dir: PathBuf) -> Self {
        Config {
            storage_dir,
            max_concurrent_downloads: DEFAULT_MAX_DOWNLOADS,
        }
    }

    pub fn with_max_concurrent_downloads(mut self, max: usize) -> Self {
        self.max_concurrent_downloads = max.max(1);
        self
    }
}

/// `<data dir>/memfetch`, or `./memfetch-data` when the platform has no data dir
fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("memfetch"))
        .unwrap_or_else(|| PathBuf::from("memfetch-data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new(PathBuf::from("/tmp/memories"));
        assert_eq!(config.max_concurrent_downloads, 5);
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/memories"));
    }

    #[test]
    fn test_width_clamps_to_one() {
        let config = Config::new(PathBuf::from("/tmp")).with_max_concurrent_downloads(0);
        assert_eq!(config.max_concurrent_downloads, 1);
    }
}
