//! Analysis boundary — scores a document's text against the stored corpus.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Error, StorageError};
use crate::extract::entities::EntityExtractor;
use crate::scoring::audit;
use crate::scoring::engine::ScoringEngine;
use crate::scoring::types::AnalysisOutcome;
use crate::store::Storage;

/// In-process analysis service.
///
/// One `analyze` call is one scoring pass: it reads a single point-in-time
/// corpus snapshot, so all four sub-scorers see the same records. Results
/// are returned, not persisted — committing the result row together with
/// the status transition is the processor's job.
pub struct AnalysisService {
    store: Arc<dyn Storage>,
    engine: ScoringEngine,
    entities: EntityExtractor,
}

impl AnalysisService {
    pub fn new(store: Arc<dyn Storage>, engine: ScoringEngine) -> Self {
        Self {
            store,
            engine,
            entities: EntityExtractor::new(),
        }
    }

    /// Score the text of an existing document.
    ///
    /// Fails with a not-found error for an unknown document id; a corpus
    /// load failure aborts the whole pass and propagates to the caller.
    pub async fn analyze(&self, document_id: i64, text: &str) -> Result<AnalysisOutcome, Error> {
        info!(document_id, "Starting analysis");

        if self.store.get_document(document_id).await?.is_none() {
            return Err(StorageError::NotFound {
                entity: "document".into(),
                id: document_id.to_string(),
            }
            .into());
        }

        let entities = self.entities.extract(text);
        let corpus = self.store.reference_corpus().await?;

        let evaluation = self.engine.evaluate(text, &entities, &corpus);
        let matched_records = audit::matched_records(text, &entities, &corpus);

        if let Ok(trail) = serde_json::to_string(&matched_records) {
            debug!(document_id, matched_records = %trail, "Audit trail");
        }

        info!(
            document_id,
            overall = evaluation.scores.overall,
            requires_manual_review = evaluation.requires_manual_review,
            "Analysis complete"
        );

        Ok(AnalysisOutcome {
            document_id,
            scores: evaluation.scores,
            requires_manual_review: evaluation.requires_manual_review,
            matched_records,
        })
    }
}
