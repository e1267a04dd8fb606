//! Document processor — the chain stages behind each queued task.
//!
//! Flow for a new file:
//! 1. Create the document row (status `processing`)
//! 2. Extract + normalize text
//! 3. Analyze (entities → four sub-scores → composite)
//! 4. Route by overall score
//! 5. Commit result + status + processed_at as one transaction
//! 6. Auto-approved documents continue into the email chain
//!
//! Review states halt the chain until a human `approve` re-enters it.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::error::{Error, PipelineError, StorageError};
use crate::extract::entities::normalize_text;
use crate::extract::text::TextExtractor;
use crate::notify::mailer::Notifier;
use crate::notify::message::{self, Notification};
use crate::pipeline::router::ReviewRouter;
use crate::pipeline::tasks::{Task, TaskDispatcher};
use crate::scoring::service::AnalysisService;
use crate::store::Storage;
use crate::store::models::{Document, DocumentStatus, NewProcessingResult};

/// Collaborators for the processor.
pub struct ProcessorDeps {
    pub store: Arc<dyn Storage>,
    pub extractor: Arc<dyn TextExtractor>,
    pub analysis: AnalysisService,
    pub dispatcher: Arc<dyn TaskDispatcher>,
    pub notifier: Arc<dyn Notifier>,
    /// Recipient for processed-document notifications.
    pub recipient: String,
}

/// Executes chain stages. One instance is shared by all queue workers.
pub struct DocumentProcessor {
    store: Arc<dyn Storage>,
    extractor: Arc<dyn TextExtractor>,
    analysis: AnalysisService,
    router: ReviewRouter,
    dispatcher: Arc<dyn TaskDispatcher>,
    notifier: Arc<dyn Notifier>,
    recipient: String,
}

impl DocumentProcessor {
    pub fn new(router: ReviewRouter, deps: ProcessorDeps) -> Self {
        Self {
            store: deps.store,
            extractor: deps.extractor,
            analysis: deps.analysis,
            router,
            dispatcher: deps.dispatcher,
            notifier: deps.notifier,
            recipient: deps.recipient,
        }
    }

    /// Execute one task. Entry point for the queue worker.
    pub async fn handle(&self, task: Task) -> Result<(), Error> {
        match task {
            Task::ProcessDocument { path } => self.process_document(&path).await.map(|_| ()),
            Task::PrepareEmail { document_id } => self.prepare_email(document_id).await,
            Task::SendEmail { document_id } => self.send_email(document_id).await,
        }
    }

    /// Ingest, score, and route one file.
    ///
    /// The result row and the status transition commit together; nothing is
    /// persisted for a failed run except the `error` status itself.
    pub async fn process_document(&self, path: &Path) -> Result<Document, Error> {
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let document = self
            .store
            .create_document(&filename, &path.to_string_lossy(), DocumentStatus::Processing)
            .await?;

        info!(document_id = document.id, filename = %filename, "Processing document");

        let text = match self.extractor.extract_text(path).await {
            Ok(text) => normalize_text(&text),
            Err(e) => {
                error!(document_id = document.id, error = %e, "Text extraction failed");
                self.mark_error(document.id).await;
                return Err(e.into());
            }
        };

        let outcome = match self.analysis.analyze(document.id, &text).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(document_id = document.id, error = %e, "Analysis failed");
                self.mark_error(document.id).await;
                return Err(e);
            }
        };

        let status = self.router.route(outcome.scores.overall);

        let result = NewProcessingResult {
            document_id: document.id,
            extracted_text: text,
            customer_match_score: outcome.scores.customer_match,
            policy_match_score: outcome.scores.policy_match,
            invoice_reconciliation_score: outcome.scores.invoice_reconciliation,
            data_quality_score: outcome.scores.data_quality,
            overall_score: outcome.scores.overall,
            requires_manual_review: outcome.requires_manual_review,
        };

        if let Err(e) = self.store.record_analysis(&result, status, Utc::now()).await {
            error!(document_id = document.id, error = %e, "Failed to commit analysis");
            self.mark_error(document.id).await;
            return Err(e.into());
        }

        info!(
            document_id = document.id,
            overall = outcome.scores.overall,
            status = %status,
            "Document routed"
        );

        // The commit above is never rolled back; a dispatch failure is
        // surfaced to the retry layer instead.
        if status == DocumentStatus::AutoApproved {
            self.dispatcher
                .dispatch(Task::PrepareEmail {
                    document_id: document.id,
                })
                .await
                .map_err(|e| {
                    error!(document_id = document.id, error = %e, "Chain dispatch failed");
                    Error::from(e)
                })?;
        }

        self.store
            .get_document(document.id)
            .await?
            .ok_or_else(|| not_found("document", document.id).into())
    }

    /// Human approval — the manual counterpart of auto-approval.
    ///
    /// Valid only for documents halted in a review state; continues the
    /// same email chain an auto-approval would.
    pub async fn approve(&self, document_id: i64) -> Result<Document, Error> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or_else(|| Error::from(not_found("document", document_id)))?;

        if !document
            .status
            .can_transition_to(DocumentStatus::ManuallyApproved)
        {
            return Err(PipelineError::InvalidTransition {
                from: document.status.to_string(),
                to: DocumentStatus::ManuallyApproved.to_string(),
            }
            .into());
        }

        self.store
            .update_document_status(document_id, DocumentStatus::ManuallyApproved)
            .await?;

        info!(document_id, "Document manually approved");

        self.dispatcher
            .dispatch(Task::PrepareEmail { document_id })
            .await?;

        self.store
            .get_document(document_id)
            .await?
            .ok_or_else(|| not_found("document", document_id).into())
    }

    /// Validate prerequisites and render the notification, then queue the
    /// send stage.
    pub async fn prepare_email(&self, document_id: i64) -> Result<(), Error> {
        let notification = self.build_notification(document_id).await?;
        info!(
            document_id,
            to = %notification.to,
            subject = %notification.subject,
            "Notification prepared"
        );

        self.dispatcher
            .dispatch(Task::SendEmail { document_id })
            .await?;
        Ok(())
    }

    /// Re-derive the notification from committed state and send it.
    pub async fn send_email(&self, document_id: i64) -> Result<(), Error> {
        let notification = self.build_notification(document_id).await?;
        self.notifier.send(&notification).await?;
        info!(document_id, "Notification sent");
        Ok(())
    }

    /// Load the document and its latest result and render the notification.
    ///
    /// Missing prerequisites are not-found conditions — terminal, no retry.
    async fn build_notification(&self, document_id: i64) -> Result<Notification, Error> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or_else(|| Error::from(not_found("document", document_id)))?;

        let result = self
            .store
            .latest_result(document_id)
            .await?
            .ok_or_else(|| Error::from(not_found("processing_result", document_id)))?;

        Ok(message::render(&document, &result, &self.recipient))
    }

    /// Best-effort transition to `error`; the original failure is what the
    /// caller propagates.
    async fn mark_error(&self, document_id: i64) {
        if let Err(e) = self
            .store
            .update_document_status(document_id, DocumentStatus::Error)
            .await
        {
            warn!(document_id, error = %e, "Failed to mark document as error");
        }
    }
}

fn not_found(entity: &str, id: i64) -> StorageError {
    StorageError::NotFound {
        entity: entity.into(),
        id: id.to_string(),
    }
}
