//! Persistent domain records — documents, results, and the reference corpus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Ingested, not yet picked up.
    Pending,
    /// A worker is extracting and scoring it.
    Processing,
    /// Scored at or above the auto-approve threshold.
    AutoApproved,
    /// Mid-band score — awaiting a quick human check.
    QuickReview,
    /// Low score — awaiting full manual review.
    ManualReview,
    /// A human approved it out of a review state.
    ManuallyApproved,
    /// Processing failed; eligible for re-queue.
    Error,
}

impl DocumentStatus {
    /// Check if this state allows transitioning to another state.
    ///
    /// Transitions are monotonic forward except the explicit manual approve
    /// (review → manually_approved) and the error re-queue
    /// (error → processing).
    pub fn can_transition_to(&self, target: DocumentStatus) -> bool {
        use DocumentStatus::*;

        matches!(
            (self, target),
            (Pending, Processing)
                | (Processing, AutoApproved)
                | (Processing, QuickReview)
                | (Processing, ManualReview)
                | (Processing, Error)
                | (QuickReview, ManuallyApproved)
                | (ManualReview, ManuallyApproved)
                | (Error, Processing)
        )
    }

    /// True for states with no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AutoApproved | Self::ManuallyApproved)
    }

    /// True for states halted pending a human approve action.
    pub fn awaits_review(&self) -> bool {
        matches!(self, Self::QuickReview | Self::ManualReview)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::AutoApproved => "auto_approved",
            Self::QuickReview => "quick_review",
            Self::ManualReview => "manual_review",
            Self::ManuallyApproved => "manually_approved",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "auto_approved" => Ok(Self::AutoApproved),
            "quick_review" => Ok(Self::QuickReview),
            "manual_review" => Ok(Self::ManualReview),
            "manually_approved" => Ok(Self::ManuallyApproved),
            "error" => Ok(Self::Error),
            other => Err(format!("Unknown document status: {other}")),
        }
    }
}

/// An ingested document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    pub file_path: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, at terminal scoring.
    pub processed_at: Option<DateTime<Utc>>,
}

/// One analysis run's scores for a document. Append-only; the latest row by
/// `created_at` is the authoritative one for downstream stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub id: i64,
    pub document_id: i64,
    pub extracted_text: String,
    pub customer_match_score: f64,
    pub policy_match_score: f64,
    pub invoice_reconciliation_score: f64,
    pub data_quality_score: f64,
    pub overall_score: f64,
    pub requires_manual_review: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a processing result (id/timestamp assigned by storage).
#[derive(Debug, Clone)]
pub struct NewProcessingResult {
    pub document_id: i64,
    pub extracted_text: String,
    pub customer_match_score: f64,
    pub policy_match_score: f64,
    pub invoice_reconciliation_score: f64,
    pub data_quality_score: f64,
    pub overall_score: f64,
    pub requires_manual_review: bool,
}

/// A known customer in the reference corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// An insurance policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub id: i64,
    pub policy_number: String,
    pub customer_id: Option<i64>,
    pub policy_type: Option<String>,
    pub status: String,
}

/// An issued invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub customer_id: Option<i64>,
    pub policy_id: Option<i64>,
    pub amount: f64,
    pub invoice_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: String,
}

/// A recorded payment/refund/adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub transaction_id: String,
    pub invoice_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub amount: f64,
    pub transaction_date: DateTime<Utc>,
    pub transaction_type: Option<String>,
    pub payment_method: Option<String>,
    pub status: String,
    pub reference_number: Option<String>,
}
