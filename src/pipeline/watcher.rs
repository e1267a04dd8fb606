//! Folder watcher — polls the inbox for new documents.
//!
//! Ingestion is idempotent: a filename whose document already carries a
//! `processed_at` timestamp is skipped; anything in-flight or errored is
//! re-enqueued (crash recovery). A per-session seen set keeps one enqueue
//! per file between polls.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::StorageError;
use crate::pipeline::tasks::{Task, TaskDispatcher};
use crate::store::Storage;

/// Extensions the pipeline accepts.
const WATCHED_EXTENSIONS: [&str; 2] = ["pdf", "eml"];

/// Polls a folder and enqueues processing for new documents.
pub struct FolderWatcher {
    store: Arc<dyn Storage>,
    dispatcher: Arc<dyn TaskDispatcher>,
    folder: PathBuf,
    poll_interval: Duration,
}

impl FolderWatcher {
    pub fn new(
        store: Arc<dyn Storage>,
        dispatcher: Arc<dyn TaskDispatcher>,
        folder: PathBuf,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            dispatcher,
            folder,
            poll_interval,
        }
    }

    /// Start the poll loop. Runs until the handle is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = tokio::fs::create_dir_all(&self.folder).await {
                error!(folder = %self.folder.display(), error = %e, "Cannot create watch folder");
                return;
            }

            info!(
                folder = %self.folder.display(),
                interval_secs = self.poll_interval.as_secs(),
                "Folder watcher started"
            );

            let mut seen: HashSet<String> = HashSet::new();
            let mut tick = tokio::time::interval(self.poll_interval);

            loop {
                tick.tick().await;
                self.scan(&mut seen).await;
            }
        })
    }

    /// One poll pass over the folder.
    ///
    /// Public so a caller can drive polling on its own schedule; `spawn`
    /// is the usual entry point.
    pub async fn scan(&self, seen: &mut HashSet<String>) {
        let mut entries = match tokio::fs::read_dir(&self.folder).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(folder = %self.folder.display(), error = %e, "Watch folder scan failed");
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !is_watched_file(&path) {
                continue;
            }

            let filename = match path.file_name() {
                Some(name) => name.to_string_lossy().to_string(),
                None => continue,
            };

            if seen.contains(&filename) {
                continue;
            }

            match should_enqueue(self.store.as_ref(), &filename).await {
                Ok(false) => {
                    debug!(filename = %filename, "Document already processed, skipping");
                    seen.insert(filename);
                }
                Ok(true) => {
                    info!(filename = %filename, "New document detected");
                    match self
                        .dispatcher
                        .dispatch(Task::ProcessDocument { path: path.clone() })
                        .await
                    {
                        Ok(()) => {
                            seen.insert(filename);
                        }
                        Err(e) => {
                            // Not marked seen — retried on the next pass.
                            error!(filename = %filename, error = %e, "Failed to enqueue document");
                        }
                    }
                }
                Err(e) => {
                    error!(filename = %filename, error = %e, "Dedup check failed; will retry");
                }
            }
        }
    }
}

fn is_watched_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| WATCHED_EXTENSIONS.contains(&e.as_str()))
}

/// The idempotency check: enqueue unless this filename was fully processed.
///
/// A document with `processed_at` set is done; one that exists without it
/// was in-flight or errored and gets re-queued.
pub(crate) async fn should_enqueue(
    store: &dyn Storage,
    filename: &str,
) -> Result<bool, StorageError> {
    match store.find_document_by_filename(filename).await? {
        Some(document) if document.processed_at.is_some() => Ok(false),
        Some(document) => {
            debug!(
                filename = %filename,
                status = %document.status,
                "Document exists but never finished; re-queuing"
            );
            Ok(true)
        }
        None => Ok(true),
    }
}
