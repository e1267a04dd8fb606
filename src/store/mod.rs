//! Persistence layer — SQLite-backed storage for documents, results, and
//! the reference corpus.

pub mod libsql_backend;
pub mod models;
pub mod traits;

pub use libsql_backend::LibSqlStorage;
pub use traits::{ReferenceCorpus, Storage};
