//! The processing pipeline — task chain, routing, and ingestion.

pub mod processor;
pub mod queue;
pub mod router;
pub mod tasks;
pub mod watcher;

pub use processor::DocumentProcessor;
pub use queue::{RetryPolicy, TaskQueue, spawn_worker};
pub use router::ReviewRouter;
pub use tasks::{Task, TaskDispatcher};
pub use watcher::FolderWatcher;
