//! Error types for DocuFlow.

use std::time::Duration;

/// Top-level error type for the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

impl Error {
    /// Whether the task layer should retry after this failure.
    ///
    /// Transient/network-class failures (pool, I/O, send) are retried by the
    /// queue worker; validation failures (not found, unsupported file type,
    /// bad transition) are terminal for the task instance.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Config(_) => false,
            Error::Storage(e) => matches!(
                e,
                StorageError::Pool(_) | StorageError::Query(_)
            ),
            Error::Extract(e) => matches!(e, ExtractError::Io(_)),
            Error::Pipeline(e) => matches!(
                e,
                PipelineError::Dispatch(_) | PipelineError::QueueClosed
            ),
            Error::Notify(e) => matches!(e, NotifyError::Send(_) | NotifyError::Io(_)),
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-related errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Text-extraction errors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    Failed(String),

    #[error("Email parse failed: {0}")]
    Email(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline/orchestration errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Task dispatch failed: {0}")]
    Dispatch(String),

    #[error("Task queue is closed")]
    QueueClosed,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Task {task} timed out after {timeout:?}")]
    Timeout { task: String, timeout: Duration },
}

/// Notification errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the pipeline.
pub type Result<T> = std::result::Result<T, Error>;
