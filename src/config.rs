//! Configuration types — environment-driven settings with spec defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::scoring::types::{ReviewPolicy, ScoreWeights};

/// Parse an env var, falling back to a default on absence or parse failure.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Top-level application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Folder polled for new `.pdf`/`.eml` documents.
    pub watch_folder: PathBuf,
    /// SQLite database file path.
    pub database_path: PathBuf,
    /// Watch-folder poll interval.
    pub poll_interval: Duration,
    /// Maximum attempts per task before it is dropped.
    pub max_task_attempts: u32,
    /// Base delay for exponential retry backoff.
    pub retry_base_delay: Duration,
    /// Tesseract language for the OCR fallback.
    pub ocr_language: String,
    /// Optional directory for rolling file logs.
    pub log_dir: Option<PathBuf>,
    /// Sub-score weights for the composite score.
    pub weights: ScoreWeights,
    /// Manual-review floors.
    pub review: ReviewPolicy,
    /// Routing thresholds on the [0,1] overall score.
    pub routing: RoutingThresholds,
    /// Outbound email settings; `None` disables sending (notifications are
    /// logged instead).
    pub email: Option<EmailSettings>,
}

/// Review-routing thresholds, held on the [0,1] scale.
///
/// The notification body displays scores on a 0–10 scale (`overall × 10`);
/// internally everything compares on [0,1].
#[derive(Debug, Clone, Copy)]
pub struct RoutingThresholds {
    /// At or above this, a document is auto-approved (boundary inclusive).
    pub auto_approve: f64,
    /// At or above this (but below auto-approve), quick review.
    pub quick_review: f64,
}

impl Default for RoutingThresholds {
    fn default() -> Self {
        Self {
            auto_approve: 0.8,
            quick_review: 0.4,
        }
    }
}

/// SMTP settings for the notification mailer.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
    pub to_address: String,
}

impl EmailSettings {
    /// Build from environment variables.
    /// Returns `None` if `DOCUFLOW_SMTP_HOST` is not set (sending disabled).
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("DOCUFLOW_SMTP_HOST").ok()?;

        let smtp_port: u16 = env_or("DOCUFLOW_SMTP_PORT", 587);
        let username = std::env::var("DOCUFLOW_SMTP_USERNAME").unwrap_or_default();
        let password =
            SecretString::from(std::env::var("DOCUFLOW_SMTP_PASSWORD").unwrap_or_default());
        let from_address =
            std::env::var("DOCUFLOW_EMAIL_FROM").unwrap_or_else(|_| username.clone());
        let to_address = std::env::var("DOCUFLOW_EMAIL_TO").unwrap_or_else(|_| from_address.clone());

        Some(Self {
            smtp_host,
            smtp_port,
            username,
            password,
            from_address,
            to_address,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            watch_folder: PathBuf::from("./inbox"),
            database_path: PathBuf::from("./data/docuflow.db"),
            poll_interval: Duration::from_secs(5),
            max_task_attempts: 3,
            retry_base_delay: Duration::from_secs(2),
            ocr_language: "eng".to_string(),
            log_dir: None,
            weights: ScoreWeights::default(),
            review: ReviewPolicy::default(),
            routing: RoutingThresholds::default(),
            email: None,
        }
    }
}

impl Settings {
    /// Build settings from environment variables, with spec defaults.
    pub fn from_env() -> Self {
        let defaults = ScoreWeights::default();
        let weights = ScoreWeights {
            customer: env_or("DOCUFLOW_WEIGHT_CUSTOMER", defaults.customer),
            policy: env_or("DOCUFLOW_WEIGHT_POLICY", defaults.policy),
            reconciliation: env_or("DOCUFLOW_WEIGHT_RECONCILIATION", defaults.reconciliation),
            quality: env_or("DOCUFLOW_WEIGHT_QUALITY", defaults.quality),
        };

        let floors = ReviewPolicy::default();
        let review = ReviewPolicy {
            overall_floor: env_or("DOCUFLOW_REVIEW_OVERALL_FLOOR", floors.overall_floor),
            customer_floor: env_or("DOCUFLOW_REVIEW_CUSTOMER_FLOOR", floors.customer_floor),
            policy_floor: env_or("DOCUFLOW_REVIEW_POLICY_FLOOR", floors.policy_floor),
            quality_floor: env_or("DOCUFLOW_REVIEW_QUALITY_FLOOR", floors.quality_floor),
        };

        let routing = RoutingThresholds {
            auto_approve: env_or("DOCUFLOW_AUTO_APPROVE_THRESHOLD", 0.8),
            quick_review: env_or("DOCUFLOW_QUICK_REVIEW_THRESHOLD", 0.4),
        };

        Self {
            watch_folder: env_or("DOCUFLOW_WATCH_FOLDER", PathBuf::from("./inbox")),
            database_path: env_or("DOCUFLOW_DB_PATH", PathBuf::from("./data/docuflow.db")),
            poll_interval: Duration::from_secs(env_or("DOCUFLOW_POLL_INTERVAL_SECS", 5)),
            max_task_attempts: env_or("DOCUFLOW_MAX_TASK_ATTEMPTS", 3),
            retry_base_delay: Duration::from_secs(env_or("DOCUFLOW_RETRY_BASE_DELAY_SECS", 2)),
            ocr_language: env_or("DOCUFLOW_OCR_LANGUAGE", "eng".to_string()),
            log_dir: std::env::var("DOCUFLOW_LOG_DIR").ok().map(PathBuf::from),
            weights,
            review,
            routing,
            email: EmailSettings::from_env(),
        }
    }
}
