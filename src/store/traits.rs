//! `Storage` trait — single async interface for all persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::store::models::{
    Customer, Document, DocumentStatus, Invoice, NewProcessingResult, Policy, ProcessingResult,
    Transaction,
};

/// A point-in-time snapshot of the reference corpus.
///
/// Loaded once per scoring pass so every sub-scorer sees the same records;
/// the core never writes to these tables during analysis.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCorpus {
    pub customers: Vec<Customer>,
    pub policies: Vec<Policy>,
    pub invoices: Vec<Invoice>,
    pub transactions: Vec<Transaction>,
}

/// Backend-agnostic storage trait covering documents, results, and the
/// reference corpus.
#[async_trait]
pub trait Storage: Send + Sync {
    // ── Documents ───────────────────────────────────────────────────

    /// Insert a new document with the given status.
    async fn create_document(
        &self,
        filename: &str,
        file_path: &str,
        status: DocumentStatus,
    ) -> Result<Document, StorageError>;

    /// Get a document by id.
    async fn get_document(&self, id: i64) -> Result<Option<Document>, StorageError>;

    /// Find the most recently created document with the given filename.
    async fn find_document_by_filename(
        &self,
        filename: &str,
    ) -> Result<Option<Document>, StorageError>;

    /// Update a document's status.
    async fn update_document_status(
        &self,
        id: i64,
        status: DocumentStatus,
    ) -> Result<(), StorageError>;

    // ── Processing results ──────────────────────────────────────────

    /// Commit one analysis run: insert the result row and move the document
    /// to its routed status with `processed_at` set, as a single
    /// transaction. This is the atomic unit of a successful run — a failure
    /// leaves neither half behind.
    async fn record_analysis(
        &self,
        result: &NewProcessingResult,
        status: DocumentStatus,
        processed_at: DateTime<Utc>,
    ) -> Result<ProcessingResult, StorageError>;

    /// The latest result for a document (by `created_at`), if any.
    async fn latest_result(
        &self,
        document_id: i64,
    ) -> Result<Option<ProcessingResult>, StorageError>;

    // ── Reference corpus ────────────────────────────────────────────

    async fn insert_customer(
        &self,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Customer, StorageError>;

    async fn insert_policy(
        &self,
        policy_number: &str,
        customer_id: Option<i64>,
        policy_type: Option<&str>,
        status: &str,
    ) -> Result<Policy, StorageError>;

    #[allow(clippy::too_many_arguments)]
    async fn insert_invoice(
        &self,
        invoice_number: &str,
        customer_id: Option<i64>,
        policy_id: Option<i64>,
        amount: f64,
        invoice_date: DateTime<Utc>,
        due_date: Option<DateTime<Utc>>,
        status: &str,
    ) -> Result<Invoice, StorageError>;

    #[allow(clippy::too_many_arguments)]
    async fn insert_transaction(
        &self,
        transaction_id: &str,
        invoice_id: Option<i64>,
        customer_id: Option<i64>,
        amount: f64,
        transaction_date: DateTime<Utc>,
        transaction_type: Option<&str>,
        payment_method: Option<&str>,
        status: &str,
        reference_number: Option<&str>,
    ) -> Result<Transaction, StorageError>;

    async fn list_customers(&self) -> Result<Vec<Customer>, StorageError>;
    async fn list_policies(&self) -> Result<Vec<Policy>, StorageError>;
    async fn list_invoices(&self) -> Result<Vec<Invoice>, StorageError>;
    async fn list_transactions(&self) -> Result<Vec<Transaction>, StorageError>;

    /// Load all four reference tables as one consistent snapshot.
    async fn reference_corpus(&self) -> Result<ReferenceCorpus, StorageError>;
}
