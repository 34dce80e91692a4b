// # Library Handle
//
// Cloneable front door to the library service: send requests, read state
// snapshots and subscribe to events. All state lives in the service task.

use crate::import::ParseError;
use crate::library::progress::{BatchSummary, EventHandle, LibraryEvent};
use crate::library::state::LibraryState;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("{0}")]
    Import(#[from] ParseError),
    #[error("A download is already in progress")]
    DownloadInProgress,
    #[error("Library service is not running")]
    ServiceStopped,
}

/// Where an import reads its export document from
#[derive(Debug)]
pub enum ImportSource {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// Requests handled by the service task
pub(crate) enum LibraryRequest {
    LoadJson {
        source: ImportSource,
        reply: oneshot::Sender<Result<usize, LibraryError>>,
    },
    StartDownload {
        reply: oneshot::Sender<Result<usize, LibraryError>>,
        on_complete: Option<oneshot::Sender<BatchSummary>>,
    },
    Snapshot {
        reply: oneshot::Sender<LibraryState>,
    },
    LocalFile {
        key: String,
        reply: oneshot::Sender<Option<PathBuf>>,
    },
    RefreshFiles {
        reply: oneshot::Sender<usize>,
    },
    Flush {
        reply: oneshot::Sender<()>,
    },
}

/// Handle for sending library requests and subscribing to events
#[derive(Clone)]
pub struct LibraryHandle {
    requests_tx: mpsc::UnboundedSender<LibraryRequest>,
    events: EventHandle,
}

impl LibraryHandle {
    pub(crate) fn new(
        requests_tx: mpsc::UnboundedSender<LibraryRequest>,
        event_rx: mpsc::UnboundedReceiver<LibraryEvent>,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        let events = EventHandle::new(event_rx, runtime_handle);

        Self {
            requests_tx,
            events,
        }
    }

    /// Import an export document from memory.
    ///
    /// On success the whole library is replaced and the new count returned.
    /// On failure the previous library is kept and the status shows the error.
    pub async fn load_json(&self, bytes: Vec<u8>) -> Result<usize, LibraryError> {
        self.import(ImportSource::Bytes(bytes)).await
    }

    /// Import an export document from disk
    pub async fn load_json_file(&self, path: impl Into<PathBuf>) -> Result<usize, LibraryError> {
        self.import(ImportSource::File(path.into())).await
    }

    async fn import(&self, source: ImportSource) -> Result<usize, LibraryError> {
        self.request(|reply| LibraryRequest::LoadJson { source, reply })
            .await?
    }

    /// Start a download batch over every memory, returning the batch size.
    ///
    /// Returns immediately; follow progress through a subscription. Fails with
    /// [`LibraryError::DownloadInProgress`] while another batch is running.
    pub async fn start_download(&self) -> Result<usize, LibraryError> {
        self.request(|reply| LibraryRequest::StartDownload {
            reply,
            on_complete: None,
        })
        .await?
    }

    /// Start a download batch and wait for it to finish
    pub async fn download_and_wait(&self) -> Result<BatchSummary, LibraryError> {
        let (complete_tx, complete_rx) = oneshot::channel();

        self.request(|reply| LibraryRequest::StartDownload {
            reply,
            on_complete: Some(complete_tx),
        })
        .await??;

        complete_rx.await.map_err(|_| LibraryError::ServiceStopped)
    }

    /// Copy of the current library state
    pub async fn snapshot(&self) -> Result<LibraryState, LibraryError> {
        self.request(|reply| LibraryRequest::Snapshot { reply }).await
    }

    /// Downloaded file for a memory key, if the index has one
    pub async fn local_file(&self, key: &str) -> Result<Option<PathBuf>, LibraryError> {
        let key = key.to_string();
        self.request(|reply| LibraryRequest::LocalFile { key, reply })
            .await
    }

    /// Rescan the storage directory, returning how many memories have files
    pub async fn refresh_files(&self) -> Result<usize, LibraryError> {
        self.request(|reply| LibraryRequest::RefreshFiles { reply })
            .await
    }

    /// Wait until the last import has been written to the state file
    pub async fn flush(&self) -> Result<(), LibraryError> {
        self.request(|reply| LibraryRequest::Flush { reply }).await
    }

    /// Subscribe to every library event.
    /// The subscription is removed when the receiver is dropped.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<LibraryEvent> {
        self.events.subscribe()
    }

    /// Subscribe to download results for one memory key
    pub fn subscribe_memory(&self, key: String) -> mpsc::UnboundedReceiver<LibraryEvent> {
        self.events.subscribe_memory(key)
    }

    async fn request<T>(
        &self,
        make_request: impl FnOnce(oneshot::Sender<T>) -> LibraryRequest,
    ) -> Result<T, LibraryError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.requests_tx
            .send(make_request(reply_tx))
            .map_err(|_| LibraryError::ServiceStopped)?;

        reply_rx.await.map_err(|_| LibraryError::ServiceStopped)
    }
}
