// Library exports for the command-line front end and integration tests

pub mod config;
pub mod download;
pub mod import;
pub mod library;
pub mod models;

pub use config::Config;
pub use download::{HttpTransport, MediaClient, MediaTransport};
pub use library::{LibraryEvent, LibraryHandle, LibraryService, LibraryState};
pub use models::{MediaKind, Memory};
