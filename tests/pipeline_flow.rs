//! End-to-end pipeline flow: watcher → queue → processor → notifier.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use docuflow::error::{ExtractError, NotifyError};
use docuflow::extract::text::TextExtractor;
use docuflow::notify::mailer::Notifier;
use docuflow::notify::message::Notification;
use docuflow::pipeline::processor::{DocumentProcessor, ProcessorDeps};
use docuflow::pipeline::queue::{self, RetryPolicy, TaskQueue};
use docuflow::pipeline::router::ReviewRouter;
use docuflow::pipeline::watcher::FolderWatcher;
use docuflow::scoring::{AnalysisService, ScoringEngine};
use docuflow::store::models::DocumentStatus;
use docuflow::store::{LibSqlStorage, Storage};

/// Extractor keyed on filename: "good" files yield a strongly matching
/// document, everything else yields unmatchable prose.
struct FilenameStubExtractor;

const STRONG_TEXT: &str = "Date: 12/31/2024\nDear John Smith,\nYour policy POL123456789 \
    premium invoice INV-4021 total $1500.00 was paid by transaction TXN-9001.\n\
    From: john.smith@example.com";

#[async_trait]
impl TextExtractor for FilenameStubExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let name = path.file_name().unwrap().to_string_lossy();
        if name.contains("good") {
            Ok(STRONG_TEXT.to_string())
        } else {
            Ok("nothing recognizable here".to_string())
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

struct Harness {
    store: Arc<LibSqlStorage>,
    processor: Arc<DocumentProcessor>,
    dispatcher: Arc<TaskQueue>,
    notifier: Arc<RecordingNotifier>,
    _worker: tokio::task::JoinHandle<()>,
}

async fn harness() -> Harness {
    let store = Arc::new(LibSqlStorage::new_memory().await.unwrap());

    let customer = store
        .insert_customer("John Smith", Some("john.smith@example.com"), Some("5551234567"))
        .await
        .unwrap();
    store
        .insert_policy("POL123456789", Some(customer.id), Some("auto"), "active")
        .await
        .unwrap();
    let invoice = store
        .insert_invoice(
            "INV-4021",
            Some(customer.id),
            None,
            1500.0,
            Utc::now(),
            None,
            "pending",
        )
        .await
        .unwrap();
    store
        .insert_transaction(
            "TXN-9001",
            Some(invoice.id),
            Some(customer.id),
            1500.0,
            Utc::now(),
            Some("payment"),
            Some("bank_transfer"),
            "completed",
            Some("REF-555"),
        )
        .await
        .unwrap();

    let (dispatcher, task_rx) = TaskQueue::new();
    let notifier = Arc::new(RecordingNotifier::default());

    let store_dyn: Arc<dyn Storage> = store.clone();
    let processor = Arc::new(DocumentProcessor::new(
        ReviewRouter::default(),
        ProcessorDeps {
            store: store_dyn.clone(),
            extractor: Arc::new(FilenameStubExtractor),
            analysis: AnalysisService::new(store_dyn, ScoringEngine::default()),
            dispatcher: dispatcher.clone(),
            notifier: notifier.clone(),
            recipient: "ops@example.com".into(),
        },
    ));

    let worker = queue::spawn_worker(
        processor.clone(),
        task_rx,
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(5),
        },
    );

    Harness {
        store,
        processor,
        dispatcher,
        notifier,
        _worker: worker,
    }
}

/// Poll until `check` passes or two seconds elapse.
async fn wait_until<F: Fn() -> bool>(check: F, what: &str) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn watched_document_flows_to_notification() {
    let h = harness().await;
    let inbox = tempfile::tempdir().unwrap();
    std::fs::write(inbox.path().join("good.pdf"), b"%PDF").unwrap();

    let watcher = FolderWatcher::new(
        h.store.clone(),
        h.dispatcher.clone(),
        inbox.path().to_path_buf(),
        Duration::from_millis(50),
    )
    .spawn();

    // The chain runs process → prepare → send without further input.
    wait_until(
        || !h.notifier.sent.lock().unwrap().is_empty(),
        "notification delivery",
    )
    .await;
    watcher.abort();

    let document = h
        .store
        .find_document_by_filename("good.pdf")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document.status, DocumentStatus::AutoApproved);
    assert!(document.processed_at.is_some());

    let result = h.store.latest_result(document.id).await.unwrap().unwrap();
    assert!(result.overall_score >= 0.8);

    let sent = h.notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Document Processed: good.pdf");
    assert!(sent[0].body.contains("auto_approved"));
}

#[tokio::test]
async fn low_scoring_document_halts_until_manual_approval() {
    let h = harness().await;

    let document = h
        .processor
        .process_document(Path::new("/inbox/junk.pdf"))
        .await
        .unwrap();
    assert_eq!(document.status, DocumentStatus::ManualReview);

    // Halted: nothing is sent while the document awaits review.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.notifier.sent.lock().unwrap().is_empty());

    // A human approves — the same chain continuation as auto-approval.
    let approved = h.processor.approve(document.id).await.unwrap();
    assert_eq!(approved.status, DocumentStatus::ManuallyApproved);

    wait_until(
        || !h.notifier.sent.lock().unwrap().is_empty(),
        "post-approval notification",
    )
    .await;

    let sent = h.notifier.sent.lock().unwrap().clone();
    assert!(sent[0].body.contains("manually_approved"));
}

#[tokio::test]
async fn restart_does_not_reprocess_finished_documents() {
    let h = harness().await;
    let inbox = tempfile::tempdir().unwrap();
    std::fs::write(inbox.path().join("good.pdf"), b"%PDF").unwrap();

    let document = h
        .processor
        .process_document(&inbox.path().join("good.pdf"))
        .await
        .unwrap();
    assert!(document.processed_at.is_some());

    // Simulate a fresh watcher session (empty seen set, same storage).
    let watcher = FolderWatcher::new(
        h.store.clone(),
        h.dispatcher.clone(),
        inbox.path().to_path_buf(),
        Duration::from_millis(10),
    );
    let mut seen = HashSet::new();
    watcher.scan(&mut seen).await;
    watcher.scan(&mut seen).await;

    tokio::time::sleep(Duration::from_millis(100)).await;

    // Still exactly one document row for the filename, still one result.
    let latest = h
        .store
        .find_document_by_filename("good.pdf")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, document.id);
}
