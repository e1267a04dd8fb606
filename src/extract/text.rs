//! Text extraction collaborator — PDF and EML sources.
//!
//! PDF text comes from `pdftotext`; when a PDF yields no text at all
//! (scanned pages), the OCR fallback renders pages with `pdftoppm` and runs
//! `tesseract` on each. EML bodies are parsed with `mail-parser`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ExtractError;

/// Text-extraction collaborator: raw text for a document file.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract raw text from the file at `path`.
    ///
    /// Failures propagate as document-processing errors; an unsupported
    /// extension fails fast without touching the file.
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Extractor backed by external tools (poppler-utils, tesseract).
pub struct DocumentTextExtractor {
    /// Tesseract language for the OCR fallback.
    ocr_language: String,
}

impl Default for DocumentTextExtractor {
    fn default() -> Self {
        Self::new("eng")
    }
}

impl DocumentTextExtractor {
    pub fn new(ocr_language: impl Into<String>) -> Self {
        Self {
            ocr_language: ocr_language.into(),
        }
    }

    /// Extract text from a PDF, with OCR fallback only when the direct
    /// extraction comes back empty.
    async fn extract_pdf(&self, path: &Path) -> Result<String, ExtractError> {
        let text = run_pdftotext(path).await?;
        if !text.trim().is_empty() {
            return Ok(text);
        }

        debug!(path = %path.display(), "pdftotext returned no text, trying OCR");
        self.ocr_pdf(path).await
    }

    /// OCR a PDF: render pages to PNG with pdftoppm, run tesseract per page.
    async fn ocr_pdf(&self, path: &Path) -> Result<String, ExtractError> {
        let temp_dir = tempfile::tempdir()?;
        let prefix = temp_dir.path().join("page");

        let status = Command::new("pdftoppm")
            .args(["-png", "-r", "300"])
            .arg(path)
            .arg(&prefix)
            .status()
            .await;

        match status {
            Ok(s) if s.success() => {}
            Ok(_) => {
                return Err(ExtractError::Failed(
                    "pdftoppm failed to render PDF pages".to_string(),
                ));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtractError::ToolNotFound(
                    "pdftoppm (install poppler-utils)".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        let mut images: Vec<PathBuf> = std::fs::read_dir(temp_dir.path())?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        images.sort();

        if images.is_empty() {
            return Err(ExtractError::Failed(
                "no page images generated from PDF".to_string(),
            ));
        }

        let mut text = String::new();
        for (page, image) in images.iter().enumerate() {
            match self.run_tesseract(image).await {
                Ok(page_text) => {
                    if !text.is_empty() {
                        text.push_str("\n\n");
                    }
                    text.push_str(&page_text);
                }
                Err(e) => {
                    warn!(page = page + 1, error = %e, "OCR failed for page");
                }
            }
        }

        Ok(text)
    }

    async fn run_tesseract(&self, image: &Path) -> Result<String, ExtractError> {
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.ocr_language])
            .output()
            .await;

        handle_tool_output(output, "tesseract (install tesseract-ocr)", "tesseract failed")
    }

    /// Extract the readable body of an EML file.
    async fn extract_eml(&self, path: &Path) -> Result<String, ExtractError> {
        let raw = tokio::fs::read(path).await?;

        let parsed = mail_parser::MessageParser::default()
            .parse(&raw)
            .ok_or_else(|| ExtractError::Email(format!("unparseable message: {}", path.display())))?;

        if let Some(text) = parsed.body_text(0) {
            return Ok(text.to_string());
        }
        if let Some(html) = parsed.body_html(0) {
            return Ok(strip_html(html.as_ref()));
        }

        Ok(String::new())
    }
}

#[async_trait]
impl TextExtractor for DocumentTextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => self.extract_pdf(path).await,
            "eml" => self.extract_eml(path).await,
            other => Err(ExtractError::UnsupportedFileType(other.to_string())),
        }
    }
}

/// Run pdftotext, writing to stdout.
async fn run_pdftotext(path: &Path) -> Result<String, ExtractError> {
    let output = Command::new("pdftotext")
        .args(["-layout", "-enc", "UTF-8"])
        .arg(path)
        .arg("-")
        .output()
        .await;

    handle_tool_output(output, "pdftotext (install poppler-utils)", "pdftotext failed")
}

/// Map tool output to extracted stdout text or an appropriate error.
fn handle_tool_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractError> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ExtractError::Failed(format!("{error_prefix}: {stderr}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Strip HTML tags and collapse whitespace (basic).
fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}
