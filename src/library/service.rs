// # Library Service - Owner of all library state
//
// A single task owns `LibraryState` and is the only writer to it:
// - Imports: parse, persist in the background, regroup, rescan files
// - Download batches: workers resolve and fetch; their outcomes come back
//   here to update the file index and progress
//
// Callers talk to the task through `LibraryHandle` and observe it through
// event subscriptions.

use crate::config::Config;
use crate::download::{build_batch, ItemOutcome, MediaClient};
use crate::import::{parse_export, parse_export_file, ParseError};
use crate::library::handle::{ImportSource, LibraryError, LibraryHandle, LibraryRequest};
use crate::library::progress::{BatchSummary, BatchTracker, LibraryEvent};
use crate::library::sections::build_sections;
use crate::library::state::{
    error_status, imported_status, DownloadProgress, LibraryState, STATUS_DOWNLOADING,
    STATUS_DOWNLOAD_COMPLETE, STATUS_PROCESSING,
};
use crate::library::store::MemoryStore;
use crate::models::Memory;
use futures::stream::{BoxStream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// A download batch in flight
struct ActiveBatch {
    outcomes: BoxStream<'static, ItemOutcome>,
    tracker: BatchTracker,
    on_complete: Option<oneshot::Sender<BatchSummary>>,
}

/// Library service that owns the memory list, file index and download progress
pub struct LibraryService {
    config: Config,
    store: MemoryStore,
    client: MediaClient,
    state: LibraryState,
    event_tx: mpsc::UnboundedSender<LibraryEvent>,
    request_rx: mpsc::UnboundedReceiver<LibraryRequest>,
    batch: Option<ActiveBatch>,
}

impl LibraryService {
    /// Start the service task, returning a handle for requests and subscriptions.
    ///
    /// Saved state is restored before the first request is handled.
    pub fn start(
        runtime_handle: tokio::runtime::Handle,
        config: Config,
        client: MediaClient,
    ) -> LibraryHandle {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let service = LibraryService {
            store: MemoryStore::new(&config.storage_dir),
            config,
            client,
            state: LibraryState::default(),
            event_tx,
            request_rx,
            batch: None,
        };

        runtime_handle.spawn(service.run());

        LibraryHandle::new(request_tx, event_rx, runtime_handle)
    }

    async fn run(mut self) {
        self.restore().await;
        info!("LibraryService: Worker started");

        loop {
            tokio::select! {
                request = self.request_rx.recv() => match request {
                    Some(request) => self.handle_request(request).await,
                    None => {
                        info!("LibraryService: Request channel closed");
                        self.drain_batch().await;
                        self.store.flush().await;
                        break;
                    }
                },
                outcome = next_outcome(&mut self.batch), if self.batch.is_some() => match outcome {
                    Some(outcome) => self.on_item_finished(outcome),
                    None => self.finish_batch().await,
                },
            }
        }
    }

    /// Load the saved memory list and rebuild everything derived from it
    async fn restore(&mut self) {
        if let Err(e) = tokio::fs::create_dir_all(&self.config.storage_dir).await {
            warn!(
                "LibraryService: Failed to create storage dir {}: {}",
                self.config.storage_dir.display(),
                e
            );
        }

        let memories = self.store.load().await;
        self.replace_memories(memories).await;
    }

    async fn handle_request(&mut self, request: LibraryRequest) {
        match request {
            LibraryRequest::LoadJson { source, reply } => {
                let result = if self.batch.is_some() {
                    Err(LibraryError::DownloadInProgress)
                } else {
                    self.import(source).await
                };
                let _ = reply.send(result);
            }
            LibraryRequest::StartDownload { reply, on_complete } => {
                let result = if self.batch.is_some() {
                    warn!("LibraryService: Ignoring download request, batch already running");
                    Err(LibraryError::DownloadInProgress)
                } else {
                    Ok(self.begin_batch(on_complete))
                };
                let _ = reply.send(result);
            }
            LibraryRequest::Snapshot { reply } => {
                let _ = reply.send(self.state.clone());
            }
            LibraryRequest::LocalFile { key, reply } => {
                let path = self
                    .state
                    .downloaded_files
                    .lookup(&key)
                    .map(|path| path.to_path_buf());
                let _ = reply.send(path);
            }
            LibraryRequest::RefreshFiles { reply } => {
                self.refresh_files().await;
                let _ = reply.send(self.state.downloaded_files.len());
            }
            LibraryRequest::Flush { reply } => {
                self.store.flush().await;
                let _ = reply.send(());
            }
        }
    }

    /// Parse an export and, only if every record is valid, replace the library
    async fn import(&mut self, source: ImportSource) -> Result<usize, LibraryError> {
        self.state.is_processing = true;
        self.set_status(STATUS_PROCESSING.to_string());

        let parsed: Result<Vec<Memory>, ParseError> = match source {
            ImportSource::Bytes(bytes) => parse_export(&bytes),
            ImportSource::File(path) => parse_export_file(&path).await,
        };

        self.state.is_processing = false;

        match parsed {
            Ok(memories) => {
                let count = memories.len();
                self.store.save(&memories);
                self.replace_memories(memories).await;

                let _ = self.event_tx.send(LibraryEvent::MemoriesReplaced { count });
                self.set_status(imported_status(count));
                info!("LibraryService: Imported {} memories", count);
                Ok(count)
            }
            Err(e) => {
                warn!("LibraryService: Import failed: {}", e);
                self.set_status(error_status(&e));
                Err(LibraryError::Import(e))
            }
        }
    }

    async fn replace_memories(&mut self, memories: Vec<Memory>) {
        self.state.all_memories = memories;
        self.state.sections = build_sections(&self.state.all_memories);
        self.refresh_files().await;
    }

    async fn refresh_files(&mut self) {
        self.state
            .downloaded_files
            .refresh(&self.state.all_memories, &self.config.storage_dir)
            .await;
    }

    /// Start a batch over a snapshot of the current memory list
    fn begin_batch(&mut self, on_complete: Option<oneshot::Sender<BatchSummary>>) -> usize {
        let memories = self.state.all_memories.clone();
        let total = memories.len();

        info!(
            "LibraryService: Starting download of {} memories ({} at a time)",
            total, self.config.max_concurrent_downloads
        );

        let outcomes = build_batch(
            memories,
            self.config.storage_dir.clone(),
            self.client.clone(),
            self.config.max_concurrent_downloads,
        );

        self.batch = Some(ActiveBatch {
            outcomes,
            tracker: BatchTracker::new(total),
            on_complete,
        });
        self.state.is_downloading = true;
        self.state.progress = DownloadProgress {
            completed: 0,
            total,
        };

        let _ = self.event_tx.send(LibraryEvent::DownloadStarted { total });
        self.set_status(STATUS_DOWNLOADING.to_string());
        total
    }

    fn on_item_finished(&mut self, outcome: ItemOutcome) {
        let Some(batch) = self.batch.as_mut() else {
            return;
        };

        if let Some(path) = outcome.status.path() {
            self.state
                .downloaded_files
                .insert(&outcome.key, path.to_path_buf());
        }

        let progress = batch.tracker.on_item_finished(&outcome.status);
        self.state.progress = progress;

        let _ = self.event_tx.send(LibraryEvent::ItemFinished {
            key: outcome.key,
            status: outcome.status,
        });
        let _ = self.event_tx.send(LibraryEvent::Progress(progress));
    }

    async fn finish_batch(&mut self) {
        let Some(batch) = self.batch.take() else {
            return;
        };

        let summary = batch.tracker.summary();
        self.refresh_files().await;

        self.state.is_downloading = false;
        self.state.progress = DownloadProgress {
            completed: self.state.progress.total,
            total: self.state.progress.total,
        };

        info!(
            "LibraryService: Download complete ({} downloaded, {} already present, {} failed)",
            summary.downloaded, summary.already_present, summary.failed
        );

        self.set_status(STATUS_DOWNLOAD_COMPLETE.to_string());
        let _ = self.event_tx.send(LibraryEvent::DownloadComplete(summary));

        if let Some(on_complete) = batch.on_complete {
            let _ = on_complete.send(summary);
        }
    }

    /// Run an in-flight batch to completion without taking new requests
    async fn drain_batch(&mut self) {
        if self.batch.is_none() {
            return;
        }

        debug!("LibraryService: Draining in-flight batch before exit");
        while let Some(outcome) = next_outcome(&mut self.batch).await {
            self.on_item_finished(outcome);
        }
        self.finish_batch().await;
    }

    fn set_status(&mut self, message: String) {
        self.state.status_message = message.clone();
        let _ = self.event_tx.send(LibraryEvent::StatusChanged { message });
    }
}

async fn next_outcome(batch: &mut Option<ActiveBatch>) -> Option<ItemOutcome> {
    match batch {
        Some(batch) => batch.outcomes.next().await,
        None => None,
    }
}
