//! Notification message rendering.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::models::{Document, ProcessingResult};

/// A rendered notification, ready for a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

/// Render the processed-document notification.
///
/// The body shows the score on the 0–10 display scale (`overall × 10`);
/// everything upstream compares on [0,1].
pub fn render(document: &Document, result: &ProcessingResult, recipient: &str) -> Notification {
    let processed_at = document
        .processed_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    let body = format!(
        "Dear Account Manager,\n\n\
         A new document has been processed successfully:\n\n\
         Document: {filename}\n\
         Status: {status}\n\
         Processing Score: {score:.1}/10\n\
         Processed At: {processed_at}\n\n\
         Attached Files:\n\
         - {file_path}\n\n\
         Best regards,\n\
         DocuFlow",
        filename = document.filename,
        status = document.status,
        score = result.overall_score * 10.0,
        processed_at = processed_at,
        file_path = document.file_path,
    );

    Notification {
        to: recipient.to_string(),
        subject: format!("Document Processed: {}", document.filename),
        body,
        attachments: vec![PathBuf::from(&document.file_path)],
    }
}
