//! Entity extraction — structured signals pulled from normalized text.
//!
//! Pure functions over text. Extraction never fails; malformed input just
//! yields empty vectors for the affected category.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Structured signals extracted from a document's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    /// Slash-separated dates (`D{1,2}/D{1,2}/D{2,4}`).
    pub dates: Vec<String>,
    /// Currency amounts with the symbol stripped, thousands separators kept.
    pub amounts: Vec<String>,
    /// Email addresses, case preserved.
    pub emails: Vec<String>,
}

impl ExtractedEntities {
    /// True when no signal of any category was found.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.amounts.is_empty() && self.emails.is_empty()
    }
}

/// Entity extractor with pre-compiled patterns.
pub struct EntityExtractor {
    date: Regex,
    amount: Regex,
    email: Regex,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self {
            // Only the slash form reaches this extractor; dash/dot dates are
            // rewritten to slashes by normalize_text upstream.
            date: Regex::new(r"\b(\d{1,2}/\d{1,2}/\d{2,4})\b").unwrap(),
            amount: Regex::new(r"[$€£]\s*(\d+(?:,\d{3})*(?:\.\d{2})?)").unwrap(),
            email: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap(),
        }
    }

    /// Extract dates, currency amounts, and email addresses.
    pub fn extract(&self, text: &str) -> ExtractedEntities {
        let dates = self
            .date
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect();

        let amounts = self
            .amount
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect();

        let emails = self
            .email
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();

        ExtractedEntities {
            dates,
            amounts,
            emails,
        }
    }
}

/// Clean and normalize extracted text before entity extraction and scoring.
///
/// Collapses whitespace runs to single spaces and rewrites dash/dot date
/// separators to slashes so the date extractor only has to know one form.
pub fn normalize_text(text: &str) -> String {
    let whitespace = Regex::new(r"\s+").unwrap();
    let date_seps = Regex::new(r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{2,4})\b").unwrap();

    let collapsed = whitespace.replace_all(text, " ");
    let normalized = date_seps.replace_all(&collapsed, "$1/$2/$3");
    normalized.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_dates_slash_form() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract("Issued 12/31/2024, due 1/5/25.");
        assert_eq!(entities.dates, vec!["12/31/2024", "1/5/25"]);
    }

    #[test]
    fn extract_amounts_strips_symbol_keeps_separators() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract("Total: $1,500.00 plus €25 and £ 300.50");
        assert_eq!(entities.amounts, vec!["1,500.00", "25", "300.50"]);
    }

    #[test]
    fn extract_emails_preserves_case() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract("Contact John.Smith@Example.COM for details");
        assert_eq!(entities.emails, vec!["John.Smith@Example.COM"]);
    }

    #[test]
    fn no_signals_returns_three_empty_sequences() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract("plain prose with nothing structured in it");
        assert!(entities.dates.is_empty());
        assert!(entities.amounts.is_empty());
        assert!(entities.emails.is_empty());
        assert!(entities.is_empty());
    }

    #[test]
    fn empty_input_is_harmless() {
        let extractor = EntityExtractor::new();
        assert!(extractor.extract("").is_empty());
    }

    #[test]
    fn dash_and_dot_dates_are_invisible_without_normalization() {
        let extractor = EntityExtractor::new();
        assert!(extractor.extract("sent 12-31-2024").dates.is_empty());
        assert!(extractor.extract("sent 12.31.2024").dates.is_empty());
    }

    #[test]
    fn normalize_rewrites_date_separators() {
        assert_eq!(normalize_text("due 12-31-2024"), "due 12/31/2024");
        assert_eq!(normalize_text("due 12.31.24"), "due 12/31/24");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(
            normalize_text("  Invoice\n\n#123\t\ttotal  "),
            "Invoice #123 total"
        );
    }

    #[test]
    fn normalized_dates_become_extractable() {
        let extractor = EntityExtractor::new();
        let text = normalize_text("statement dated 03-15-2024");
        assert_eq!(extractor.extract(&text).dates, vec!["03/15/2024"]);
    }

    #[test]
    fn amount_without_cents_or_commas() {
        let extractor = EntityExtractor::new();
        assert_eq!(extractor.extract("fee $42").amounts, vec!["42"]);
    }
}
