//! Task definitions and the dispatch capability.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// One unit of work in the processing chain.
///
/// Delivery is at-least-once; every stage re-reads the state it needs, so a
/// repeated delivery re-derives rather than corrupts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Task {
    /// Extract, score, and route a newly observed file.
    ProcessDocument { path: PathBuf },
    /// Validate prerequisites and render the notification for a document.
    PrepareEmail { document_id: i64 },
    /// Send the notification for a document.
    SendEmail { document_id: i64 },
}

impl Task {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProcessDocument { .. } => "process_document",
            Self::PrepareEmail { .. } => "prepare_email",
            Self::SendEmail { .. } => "send_email",
        }
    }
}

/// Injected task-dispatch capability.
///
/// Handed to the orchestrator rather than reached for globally, so tests
/// can substitute an in-memory fake.
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    /// Enqueue a task for asynchronous execution.
    async fn dispatch(&self, task: Task) -> Result<(), PipelineError>;
}
