//! In-memory task queue — at-least-once execution with retry backoff.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::{Error, PipelineError};
use crate::pipeline::processor::DocumentProcessor;
use crate::pipeline::tasks::{Task, TaskDispatcher};

/// Retry policy for failed task executions.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempts per task (first run included).
    pub max_attempts: u32,
    /// Base delay; doubled after each failed attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// Dispatch half of the in-memory queue.
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<Task>,
}

impl TaskQueue {
    /// Create the queue; the receiver goes to [`spawn_worker`].
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Task>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl TaskDispatcher for TaskQueue {
    async fn dispatch(&self, task: Task) -> Result<(), PipelineError> {
        info!(task = task.label(), "Task enqueued");
        self.tx.send(task).map_err(|_| PipelineError::QueueClosed)
    }
}

/// Spawn the worker loop consuming the queue.
///
/// Each task is executed at least once. Transient failures are retried with
/// exponential backoff up to the policy's cap; validation failures
/// (not-found, unsupported file type, bad transition) end the task instance
/// immediately.
pub fn spawn_worker(
    processor: Arc<DocumentProcessor>,
    mut rx: mpsc::UnboundedReceiver<Task>,
    retry: RetryPolicy,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(task) = rx.recv().await {
            let processor = processor.clone();
            run_with_retry(task, &retry, move |task| {
                let processor = processor.clone();
                async move { processor.handle(task).await }
            })
            .await;
        }
        info!("Task queue closed; worker stopping");
    })
}

/// Run one task through the retry policy.
pub(crate) async fn run_with_retry<F, Fut>(task: Task, retry: &RetryPolicy, handler: F)
where
    F: Fn(Task) -> Fut,
    Fut: Future<Output = Result<(), Error>>,
{
    let label = task.label();
    let mut attempt = 1u32;

    loop {
        match handler(task.clone()).await {
            Ok(()) => {
                info!(task = label, attempt, "Task completed");
                return;
            }
            Err(e) if e.is_transient() && attempt < retry.max_attempts => {
                let delay = retry.base_delay * 2u32.saturating_pow(attempt - 1);
                warn!(
                    task = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient task failure; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!(task = label, attempt, error = %e, "Task failed");
                return;
            }
        }
    }
}
