//! libSQL backend — async `Storage` trait implementation.
//!
//! Local file and in-memory databases over a single shared connection.
//! `libsql::Connection` is `Send + Sync` and safe for concurrent async use.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::store::models::{
    Customer, Document, DocumentStatus, Invoice, NewProcessingResult, Policy, ProcessingResult,
    Transaction,
};
use crate::store::traits::{ReferenceCorpus, Storage};

/// libSQL storage backend.
pub struct LibSqlStorage {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStorage {
    /// Open (or create) a local database file and initialize the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StorageError::Pool(format!("Failed to open database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StorageError::Pool(format!("Failed to create connection: {e}")))?;

        let storage = Self {
            db: Arc::new(db),
            conn,
        };
        storage.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(storage)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StorageError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StorageError::Pool(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StorageError::Pool(format!("Failed to create connection: {e}")))?;

        let storage = Self {
            db: Arc::new(db),
            conn,
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Create tables and indexes. Idempotent.
    ///
    /// Matching scans these tables in bulk; at larger corpus sizes the
    /// unique number columns below are where an exact-match lookup would go
    /// before falling back to fuzzy scoring.
    async fn init_schema(&self) -> Result<(), StorageError> {
        self.conn()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS documents (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    filename TEXT NOT NULL,
                    file_path TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'pending',
                    created_at TEXT NOT NULL,
                    processed_at TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_documents_filename ON documents(filename);
                CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);

                CREATE TABLE IF NOT EXISTS processing_results (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    document_id INTEGER NOT NULL,
                    extracted_text TEXT NOT NULL,
                    customer_match_score REAL NOT NULL,
                    policy_match_score REAL NOT NULL,
                    invoice_reconciliation_score REAL NOT NULL,
                    data_quality_score REAL NOT NULL,
                    overall_score REAL NOT NULL,
                    requires_manual_review INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_results_document
                    ON processing_results(document_id);

                CREATE TABLE IF NOT EXISTS customers (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT UNIQUE,
                    phone TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS policies (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    policy_number TEXT NOT NULL UNIQUE,
                    customer_id INTEGER,
                    policy_type TEXT,
                    status TEXT NOT NULL DEFAULT 'active',
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS invoices (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    invoice_number TEXT NOT NULL UNIQUE,
                    customer_id INTEGER,
                    policy_id INTEGER,
                    amount REAL NOT NULL,
                    invoice_date TEXT NOT NULL,
                    due_date TEXT,
                    status TEXT NOT NULL DEFAULT 'pending',
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS transactions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    transaction_id TEXT NOT NULL UNIQUE,
                    invoice_id INTEGER,
                    customer_id INTEGER,
                    amount REAL NOT NULL,
                    transaction_date TEXT NOT NULL,
                    transaction_type TEXT,
                    payment_method TEXT,
                    status TEXT NOT NULL DEFAULT 'completed',
                    reference_number TEXT,
                    created_at TEXT NOT NULL
                );",
            )
            .await
            .map_err(|e| StorageError::Query(format!("init_schema: {e}")))?;

        debug!("Schema initialized");
        Ok(())
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Convert `Option<&str>` to a libsql Value (NULL when absent).
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Convert `Option<String>` to a libsql Value.
fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// Convert `Option<i64>` to a libsql Value.
fn opt_int(v: Option<i64>) -> libsql::Value {
    match v {
        Some(v) => libsql::Value::Integer(v),
        None => libsql::Value::Null,
    }
}

/// Map a query error, flagging UNIQUE violations as constraint errors.
fn map_query_err(op: &str, e: libsql::Error) -> StorageError {
    let message = e.to_string();
    if message.contains("UNIQUE") {
        StorageError::Constraint(format!("{op}: {message}"))
    } else {
        StorageError::Query(format!("{op}: {message}"))
    }
}

/// Column order: id, filename, file_path, status, created_at, processed_at.
const DOCUMENT_COLUMNS: &str = "id, filename, file_path, status, created_at, processed_at";

fn row_to_document(row: &libsql::Row) -> Result<Document, libsql::Error> {
    let status_str: String = row.get(3)?;
    Ok(Document {
        id: row.get(0)?,
        filename: row.get(1)?,
        file_path: row.get(2)?,
        status: status_str
            .parse()
            .unwrap_or(DocumentStatus::Pending),
        created_at: parse_datetime(&row.get::<String>(4)?),
        processed_at: row.get::<String>(5).ok().map(|s| parse_datetime(&s)),
    })
}

const RESULT_COLUMNS: &str = "id, document_id, extracted_text, customer_match_score, \
     policy_match_score, invoice_reconciliation_score, data_quality_score, overall_score, \
     requires_manual_review, created_at";

fn row_to_result(row: &libsql::Row) -> Result<ProcessingResult, libsql::Error> {
    Ok(ProcessingResult {
        id: row.get(0)?,
        document_id: row.get(1)?,
        extracted_text: row.get(2)?,
        customer_match_score: row.get(3)?,
        policy_match_score: row.get(4)?,
        invoice_reconciliation_score: row.get(5)?,
        data_quality_score: row.get(6)?,
        overall_score: row.get(7)?,
        requires_manual_review: row.get::<i64>(8)? != 0,
        created_at: parse_datetime(&row.get::<String>(9)?),
    })
}

fn row_to_customer(row: &libsql::Row) -> Result<Customer, libsql::Error> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get::<String>(2).ok(),
        phone: row.get::<String>(3).ok(),
    })
}

fn row_to_policy(row: &libsql::Row) -> Result<Policy, libsql::Error> {
    Ok(Policy {
        id: row.get(0)?,
        policy_number: row.get(1)?,
        customer_id: row.get::<i64>(2).ok(),
        policy_type: row.get::<String>(3).ok(),
        status: row.get(4)?,
    })
}

fn row_to_invoice(row: &libsql::Row) -> Result<Invoice, libsql::Error> {
    Ok(Invoice {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        customer_id: row.get::<i64>(2).ok(),
        policy_id: row.get::<i64>(3).ok(),
        amount: row.get(4)?,
        invoice_date: parse_datetime(&row.get::<String>(5)?),
        due_date: row.get::<String>(6).ok().map(|s| parse_datetime(&s)),
        status: row.get(7)?,
    })
}

fn row_to_transaction(row: &libsql::Row) -> Result<Transaction, libsql::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        invoice_id: row.get::<i64>(2).ok(),
        customer_id: row.get::<i64>(3).ok(),
        amount: row.get(4)?,
        transaction_date: parse_datetime(&row.get::<String>(5)?),
        transaction_type: row.get::<String>(6).ok(),
        payment_method: row.get::<String>(7).ok(),
        status: row.get(8)?,
        reference_number: row.get::<String>(9).ok(),
    })
}

impl LibSqlStorage {
    /// Body of [`Storage::record_analysis`], run inside an open transaction.
    async fn record_analysis_inner(
        &self,
        result: &NewProcessingResult,
        status: DocumentStatus,
        processed_at: DateTime<Utc>,
    ) -> Result<ProcessingResult, StorageError> {
        let conn = self.conn();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO processing_results (document_id, extracted_text, \
             customer_match_score, policy_match_score, invoice_reconciliation_score, \
             data_quality_score, overall_score, requires_manual_review, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                result.document_id,
                result.extracted_text.clone(),
                result.customer_match_score,
                result.policy_match_score,
                result.invoice_reconciliation_score,
                result.data_quality_score,
                result.overall_score,
                result.requires_manual_review as i64,
                now.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| map_query_err("record_analysis insert", e))?;

        let result_id = conn.last_insert_rowid();

        let updated = conn
            .execute(
                "UPDATE documents SET status = ?1, processed_at = ?2 WHERE id = ?3",
                params![status.to_string(), processed_at.to_rfc3339(), result.document_id],
            )
            .await
            .map_err(|e| map_query_err("record_analysis update", e))?;

        if updated == 0 {
            return Err(StorageError::NotFound {
                entity: "document".into(),
                id: result.document_id.to_string(),
            });
        }

        Ok(ProcessingResult {
            id: result_id,
            document_id: result.document_id,
            extracted_text: result.extracted_text.clone(),
            customer_match_score: result.customer_match_score,
            policy_match_score: result.policy_match_score,
            invoice_reconciliation_score: result.invoice_reconciliation_score,
            data_quality_score: result.data_quality_score,
            overall_score: result.overall_score,
            requires_manual_review: result.requires_manual_review,
            created_at: now,
        })
    }
}

#[async_trait]
impl Storage for LibSqlStorage {
    // ── Documents ───────────────────────────────────────────────────

    async fn create_document(
        &self,
        filename: &str,
        file_path: &str,
        status: DocumentStatus,
    ) -> Result<Document, StorageError> {
        let conn = self.conn();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO documents (filename, file_path, status, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![filename, file_path, status.to_string(), now.to_rfc3339()],
        )
        .await
        .map_err(|e| map_query_err("create_document", e))?;

        let id = conn.last_insert_rowid();
        debug!(document_id = id, filename, "Document created");

        Ok(Document {
            id,
            filename: filename.to_string(),
            file_path: file_path.to_string(),
            status,
            created_at: now,
            processed_at: None,
        })
    }

    async fn get_document(&self, id: i64) -> Result<Option<Document>, StorageError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| map_query_err("get_document", e))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let doc = row_to_document(&row)
                    .map_err(|e| StorageError::Query(format!("get_document row parse: {e}")))?;
                Ok(Some(doc))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(map_query_err("get_document next", e)),
        }
    }

    async fn find_document_by_filename(
        &self,
        filename: &str,
    ) -> Result<Option<Document>, StorageError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE filename = ?1 \
                     ORDER BY created_at DESC, id DESC LIMIT 1"
                ),
                params![filename],
            )
            .await
            .map_err(|e| map_query_err("find_document_by_filename", e))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let doc = row_to_document(&row).map_err(|e| {
                    StorageError::Query(format!("find_document_by_filename row parse: {e}"))
                })?;
                Ok(Some(doc))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(map_query_err("find_document_by_filename next", e)),
        }
    }

    async fn update_document_status(
        &self,
        id: i64,
        status: DocumentStatus,
    ) -> Result<(), StorageError> {
        let updated = self
            .conn()
            .execute(
                "UPDATE documents SET status = ?1 WHERE id = ?2",
                params![status.to_string(), id],
            )
            .await
            .map_err(|e| map_query_err("update_document_status", e))?;

        if updated == 0 {
            return Err(StorageError::NotFound {
                entity: "document".into(),
                id: id.to_string(),
            });
        }

        debug!(document_id = id, status = %status, "Document status updated");
        Ok(())
    }

    // ── Processing results ──────────────────────────────────────────

    async fn record_analysis(
        &self,
        result: &NewProcessingResult,
        status: DocumentStatus,
        processed_at: DateTime<Utc>,
    ) -> Result<ProcessingResult, StorageError> {
        let conn = self.conn();

        conn.execute("BEGIN IMMEDIATE", ())
            .await
            .map_err(|e| map_query_err("record_analysis begin", e))?;

        match self
            .record_analysis_inner(result, status, processed_at)
            .await
        {
            Ok(row) => {
                conn.execute("COMMIT", ())
                    .await
                    .map_err(|e| map_query_err("record_analysis commit", e))?;
                Ok(row)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    async fn latest_result(
        &self,
        document_id: i64,
    ) -> Result<Option<ProcessingResult>, StorageError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {RESULT_COLUMNS} FROM processing_results WHERE document_id = ?1 \
                     ORDER BY created_at DESC, id DESC LIMIT 1"
                ),
                params![document_id],
            )
            .await
            .map_err(|e| map_query_err("latest_result", e))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let result = row_to_result(&row)
                    .map_err(|e| StorageError::Query(format!("latest_result row parse: {e}")))?;
                Ok(Some(result))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(map_query_err("latest_result next", e)),
        }
    }

    // ── Reference corpus ────────────────────────────────────────────

    async fn insert_customer(
        &self,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Customer, StorageError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO customers (name, email, phone, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, opt_text(email), opt_text(phone), Utc::now().to_rfc3339()],
        )
        .await
        .map_err(|e| map_query_err("insert_customer", e))?;

        Ok(Customer {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        })
    }

    async fn insert_policy(
        &self,
        policy_number: &str,
        customer_id: Option<i64>,
        policy_type: Option<&str>,
        status: &str,
    ) -> Result<Policy, StorageError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO policies (policy_number, customer_id, policy_type, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                policy_number,
                opt_int(customer_id),
                opt_text(policy_type),
                status,
                Utc::now().to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| map_query_err("insert_policy", e))?;

        Ok(Policy {
            id: conn.last_insert_rowid(),
            policy_number: policy_number.to_string(),
            customer_id,
            policy_type: policy_type.map(str::to_string),
            status: status.to_string(),
        })
    }

    async fn insert_invoice(
        &self,
        invoice_number: &str,
        customer_id: Option<i64>,
        policy_id: Option<i64>,
        amount: f64,
        invoice_date: DateTime<Utc>,
        due_date: Option<DateTime<Utc>>,
        status: &str,
    ) -> Result<Invoice, StorageError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO invoices (invoice_number, customer_id, policy_id, amount, \
             invoice_date, due_date, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                invoice_number,
                opt_int(customer_id),
                opt_int(policy_id),
                amount,
                invoice_date.to_rfc3339(),
                opt_text_owned(due_date.map(|d| d.to_rfc3339())),
                status,
                Utc::now().to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| map_query_err("insert_invoice", e))?;

        Ok(Invoice {
            id: conn.last_insert_rowid(),
            invoice_number: invoice_number.to_string(),
            customer_id,
            policy_id,
            amount,
            invoice_date,
            due_date,
            status: status.to_string(),
        })
    }

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
    ) -> Result<Transaction, StorageError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO transactions (transaction_id, invoice_id, customer_id, amount, \
             transaction_date, transaction_type, payment_method, status, reference_number, \
             created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                transaction_id,
                opt_int(invoice_id),
                opt_int(customer_id),
                amount,
                transaction_date.to_rfc3339(),
                opt_text(transaction_type),
                opt_text(payment_method),
                status,
                opt_text(reference_number),
                Utc::now().to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| map_query_err("insert_transaction", e))?;

        Ok(Transaction {
            id: conn.last_insert_rowid(),
            transaction_id: transaction_id.to_string(),
            invoice_id,
            customer_id,
            amount,
            transaction_date,
            transaction_type: transaction_type.map(str::to_string),
            payment_method: payment_method.map(str::to_string),
            status: status.to_string(),
            reference_number: reference_number.map(str::to_string),
        })
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StorageError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, name, email, phone FROM customers ORDER BY id ASC",
                (),
            )
            .await
            .map_err(|e| map_query_err("list_customers", e))?;

        let mut customers = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_customer(&row) {
                Ok(customer) => customers.push(customer),
                Err(e) => tracing::warn!("Skipping customer row: {e}"),
            }
        }
        Ok(customers)
    }

    async fn list_policies(&self) -> Result<Vec<Policy>, StorageError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, policy_number, customer_id, policy_type, status \
                 FROM policies ORDER BY id ASC",
                (),
            )
            .await
            .map_err(|e| map_query_err("list_policies", e))?;

        let mut policies = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_policy(&row) {
                Ok(policy) => policies.push(policy),
                Err(e) => tracing::warn!("Skipping policy row: {e}"),
            }
        }
        Ok(policies)
    }

    async fn list_invoices(&self) -> Result<Vec<Invoice>, StorageError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, invoice_number, customer_id, policy_id, amount, invoice_date, \
                 due_date, status FROM invoices ORDER BY id ASC",
                (),
            )
            .await
            .map_err(|e| map_query_err("list_invoices", e))?;

        let mut invoices = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_invoice(&row) {
                Ok(invoice) => invoices.push(invoice),
                Err(e) => tracing::warn!("Skipping invoice row: {e}"),
            }
        }
        Ok(invoices)
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, transaction_id, invoice_id, customer_id, amount, transaction_date, \
                 transaction_type, payment_method, status, reference_number \
                 FROM transactions ORDER BY id ASC",
                (),
            )
            .await
            .map_err(|e| map_query_err("list_transactions", e))?;

        let mut transactions = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_transaction(&row) {
                Ok(transaction) => transactions.push(transaction),
                Err(e) => tracing::warn!("Skipping transaction row: {e}"),
            }
        }
        Ok(transactions)
    }

    async fn reference_corpus(&self) -> Result<ReferenceCorpus, StorageError> {
        let conn = self.conn();

        // One transaction so all four reads see the same point in time.
        conn.execute("BEGIN", ())
            .await
            .map_err(|e| map_query_err("reference_corpus begin", e))?;

        let loaded = async {
            Ok::<_, StorageError>(ReferenceCorpus {
                customers: self.list_customers().await?,
                policies: self.list_policies().await?,
                invoices: self.list_invoices().await?,
                transactions: self.list_transactions().await?,
            })
        }
        .await;

        match loaded {
            Ok(corpus) => {
                conn.execute("COMMIT", ())
                    .await
                    .map_err(|e| map_query_err("reference_corpus commit", e))?;
                Ok(corpus)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }
}
