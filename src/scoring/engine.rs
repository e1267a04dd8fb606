//! The four sub-scorers and the weighted composite.
//!
//! Every scorer is a total function over the text, its extracted entities,
//! and an already-loaded corpus snapshot — there is no failure path inside
//! a scorer. The only fallible step of an analysis is the snapshot load,
//! which lives in the service layer and aborts the whole pass.

use regex::Regex;
use tracing::warn;

use crate::extract::entities::ExtractedEntities;
use crate::matching;
use crate::scoring::types::{Evaluation, ReviewPolicy, ScoreSet, ScoreWeights};
use crate::store::models::{Customer, Invoice, Policy, Transaction};
use crate::store::traits::ReferenceCorpus;

/// Vocabulary whose density contributes to the policy score (scaled to a
/// maximum of 50 points).
const POLICY_KEYWORDS: [&str; 6] = [
    "policy",
    "coverage",
    "premium",
    "claim",
    "deductible",
    "beneficiary",
];

/// Vocabulary whose density contributes to the reconciliation structural
/// score (capped at 0.15).
const INVOICE_KEYWORDS: [&str; 14] = [
    "invoice",
    "receipt",
    "payment",
    "bill",
    "statement",
    "total",
    "subtotal",
    "tax",
    "due",
    "balance",
    "amount due",
    "paid",
    "transaction",
    "reference",
];

/// Label markers counted by the data-quality scorer (0.5 each, capped at 1.0).
const QUALITY_MARKERS: [&str; 6] = ["date:", "amount:", "total:", "from:", "to:", "subject:"];

/// Titles that mark a following word as a probable customer name.
const NAME_TITLES: [&str; 9] = [
    "mr", "mrs", "ms", "dr", "mr.", "mrs.", "ms.", "dr.", "name",
];

/// Pre-compiled patterns for the signals the scorers pull out of text.
pub(crate) struct SignalPatterns {
    dear: Regex,
    name_label: Regex,
    phone: Regex,
    policy_numbers: Vec<Regex>,
    invoice_prefixed: Regex,
    invoice_labeled: Regex,
    invoice_digits: Regex,
    invoice_alpha: Regex,
}

impl SignalPatterns {
    pub(crate) fn new() -> Self {
        Self {
            dear: Regex::new(r"Dear\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap(),
            name_label: Regex::new(r"Name:\s*([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap(),
            phone: Regex::new(r"[\d\s()+-]+").unwrap(),
            policy_numbers: vec![
                Regex::new(r"[A-Z]{2,3}\d{6,10}").unwrap(),
                Regex::new(r"\d{8,12}").unwrap(),
                Regex::new(r"[A-Z]\d{7,9}").unwrap(),
            ],
            invoice_prefixed: Regex::new(r"(?i)INV[-\s]?\d{4,10}").unwrap(),
            invoice_labeled: Regex::new(r"(?i)Invoice\s*#?\s*(\d{4,10})").unwrap(),
            invoice_digits: Regex::new(r"\b\d{6,10}\b").unwrap(),
            invoice_alpha: Regex::new(r"(?i)[A-Z]{2,3}\d{6,8}").unwrap(),
        }
    }

    /// Potential customer names: title + following word(s), `Dear X`
    /// salutations, and `Name:` labels.
    pub(crate) fn name_indicators(&self, text: &str) -> Vec<String> {
        let mut names = Vec::new();
        let words: Vec<&str> = text.split_whitespace().collect();

        for i in 0..words.len().saturating_sub(1) {
            if NAME_TITLES.contains(&words[i].to_lowercase().as_str()) {
                names.push(format!("{} {}", words[i], words[i + 1]));
                if i + 2 < words.len() {
                    let third: String = words[i + 2].replace(',', "");
                    if !third.is_empty() && third.chars().all(char::is_alphabetic) {
                        names.push(format!("{} {} {}", words[i], words[i + 1], third));
                    }
                }
            }
        }

        for captures in self.dear.captures_iter(text) {
            names.push(captures[1].to_string());
        }
        for captures in self.name_label.captures_iter(text) {
            names.push(captures[1].to_string());
        }

        names
    }

    /// Digit-only phone-like tokens with at least 7 digits.
    pub(crate) fn phone_tokens(&self, text: &str) -> Vec<String> {
        self.phone
            .find_iter(text)
            .map(|m| matching::digits(m.as_str()))
            .filter(|digits| digits.len() >= 7)
            .collect()
    }

    /// Candidate policy numbers from all three pattern families.
    pub(crate) fn policy_number_candidates(&self, text: &str) -> Vec<String> {
        self.policy_numbers
            .iter()
            .flat_map(|pattern| pattern.find_iter(text).map(|m| m.as_str().to_string()))
            .collect()
    }

    /// Candidate invoice numbers from all four pattern families.
    pub(crate) fn invoice_number_candidates(&self, text: &str) -> Vec<String> {
        let mut candidates: Vec<String> = self
            .invoice_prefixed
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
        candidates.extend(
            self.invoice_labeled
                .captures_iter(text)
                .map(|c| c[1].to_string()),
        );
        candidates.extend(
            self.invoice_digits
                .find_iter(text)
                .map(|m| m.as_str().to_string()),
        );
        candidates.extend(
            self.invoice_alpha
                .find_iter(text)
                .map(|m| m.as_str().to_string()),
        );
        candidates
    }
}

/// Parse an extracted amount string ("1,500.00") to a float.
pub(crate) fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Scoring engine — four sub-scorers combined by configured weights.
pub struct ScoringEngine {
    weights: ScoreWeights,
    review: ReviewPolicy,
    signals: SignalPatterns,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoreWeights::default(), ReviewPolicy::default())
    }
}

impl ScoringEngine {
    pub fn new(weights: ScoreWeights, review: ReviewPolicy) -> Self {
        Self {
            weights,
            review,
            signals: SignalPatterns::new(),
        }
    }

    /// Score a document's text against the corpus snapshot.
    pub fn evaluate(
        &self,
        text: &str,
        entities: &ExtractedEntities,
        corpus: &ReferenceCorpus,
    ) -> Evaluation {
        let customer_match = self.customer_match(text, entities, &corpus.customers);
        let policy_match = self.policy_match(text, &corpus.policies);
        let invoice_reconciliation =
            self.invoice_reconciliation(text, entities, &corpus.invoices, &corpus.transactions);
        let data_quality = self.data_quality(text, entities);

        let overall = self.weights.overall(
            customer_match,
            policy_match,
            invoice_reconciliation,
            data_quality,
        );

        let scores = ScoreSet {
            customer_match,
            policy_match,
            invoice_reconciliation,
            data_quality,
            overall,
        };

        Evaluation {
            requires_manual_review: self.review.requires_manual_review(&scores),
            scores,
        }
    }

    /// Best fuzzy match of any in-text customer signal against any stored
    /// customer: name indicators (partial ratio), emails (ratio), phone-like
    /// tokens (digit-only ratio). Global max over all candidates, /100.
    fn customer_match(
        &self,
        text: &str,
        entities: &ExtractedEntities,
        customers: &[Customer],
    ) -> f64 {
        if customers.is_empty() {
            warn!("No customers in reference corpus");
            return 0.0;
        }

        let indicators: Vec<String> = self
            .signals
            .name_indicators(text)
            .iter()
            .map(|s| s.to_lowercase())
            .collect();
        let emails: Vec<String> = entities.emails.iter().map(|e| e.to_lowercase()).collect();
        let phones = self.signals.phone_tokens(text);

        let mut best = 0u32;
        for customer in customers {
            let name = customer.name.to_lowercase();
            for indicator in &indicators {
                best = best.max(matching::partial_ratio(indicator, &name));
            }

            if let Some(ref customer_email) = customer.email {
                let customer_email = customer_email.to_lowercase();
                for email in &emails {
                    best = best.max(matching::ratio(email, &customer_email));
                }
            }

            if let Some(ref customer_phone) = customer.phone {
                for phone in &phones {
                    best = best.max(matching::digit_ratio(phone, customer_phone));
                }
            }
        }

        f64::from(best) / 100.0
    }

    /// Best of: candidate-number ratio against any stored policy number, a
    /// flat 90 for a verbatim (case-insensitive) mention, and the
    /// keyword-density score (max 50). Final value /100.
    fn policy_match(&self, text: &str, policies: &[Policy]) -> f64 {
        if policies.is_empty() {
            warn!("No policies in reference corpus");
            return 0.0;
        }

        let text_lower = text.to_lowercase();
        let candidates = self.signals.policy_number_candidates(text);

        let mut best = 0u32;
        for policy in policies {
            for candidate in &candidates {
                best = best.max(matching::ratio(candidate, &policy.policy_number));
            }

            if text_lower.contains(&policy.policy_number.to_lowercase()) {
                best = best.max(90);
            }
        }

        let keyword_hits = POLICY_KEYWORDS
            .iter()
            .filter(|keyword| text_lower.contains(**keyword))
            .count();
        let keyword_score =
            (keyword_hits as f64 / POLICY_KEYWORDS.len() as f64 * 50.0).min(50.0);

        (f64::from(best) / 100.0).max(keyword_score / 100.0)
    }

    /// Weighted composite over invoice matching (×0.4), transaction matching
    /// (×0.3), document structure, and a cross-validation bonus. Clamped to
    /// [0,1]. Unlike the other scorers this is a sum, not a max.
    fn invoice_reconciliation(
        &self,
        text: &str,
        entities: &ExtractedEntities,
        invoices: &[Invoice],
        transactions: &[Transaction],
    ) -> f64 {
        let text_lower = text.to_lowercase();
        let amounts: Vec<f64> = entities
            .amounts
            .iter()
            .filter_map(|raw| parse_amount(raw))
            .collect();
        let candidates = self.signals.invoice_number_candidates(text);

        let mut score = 0.0;

        let mut invoice_component = 0.0;
        if !invoices.is_empty() {
            let mut best = 0u32;
            for invoice in invoices {
                for candidate in &candidates {
                    best = best.max(matching::ratio(candidate, &invoice.invoice_number));
                }

                for &amount in &amounts {
                    if (amount - invoice.amount).abs() < 0.01 {
                        best = best.max(95);
                    } else if invoice.amount != 0.0
                        && ((amount - invoice.amount) / invoice.amount).abs() < 0.05
                    {
                        best = best.max(80);
                    }
                }
            }
            invoice_component = f64::from(best) / 100.0;
            score += invoice_component * 0.4;
        }

        let mut transaction_component = 0.0;
        if !transactions.is_empty() {
            let mut best = 0u32;
            for transaction in transactions {
                if text_lower.contains(&transaction.transaction_id.to_lowercase()) {
                    best = best.max(90);
                }

                if let Some(ref reference) = transaction.reference_number
                    && text_lower.contains(&reference.to_lowercase())
                {
                    best = best.max(85);
                }

                for &amount in &amounts {
                    if (amount - transaction.amount).abs() < 0.01 {
                        best = best.max(90);
                    } else if transaction.amount != 0.0
                        && ((amount - transaction.amount) / transaction.amount.abs()).abs() < 0.05
                    {
                        best = best.max(75);
                    }
                }
            }
            transaction_component = f64::from(best) / 100.0;
            score += transaction_component * 0.3;
        }

        // Document-structure signals.
        let mut structure = 0.0;
        if !amounts.is_empty() {
            structure += 0.1;
            if amounts.len() > 1 {
                structure += 0.05;
            }
        }
        let keyword_hits = INVOICE_KEYWORDS
            .iter()
            .filter(|keyword| text_lower.contains(**keyword))
            .count();
        structure += (keyword_hits as f64 / INVOICE_KEYWORDS.len() as f64).min(0.15);
        if !entities.dates.is_empty() {
            structure += 0.05;
        }
        score += structure;

        // Cross-validation bonus when both raw components agree.
        if invoice_component > 0.5 && transaction_component > 0.5 {
            score += 0.1;
        }

        score.clamp(0.0, 1.0)
    }

    /// Structural heuristic over text + entities; corpus-independent.
    /// Additive out of 10, then normalized.
    fn data_quality(&self, text: &str, entities: &ExtractedEntities) -> f64 {
        let mut score = 0.0;

        if !entities.dates.is_empty() {
            score += 2.0;
        }
        if !entities.amounts.is_empty() {
            score += 2.0;
        }
        if !entities.emails.is_empty() {
            score += 1.5;
        }

        if text.len() > 100 {
            score += 1.5;
        }
        if text.len() > 500 {
            score += 1.0;
        }

        if text.contains(['\n', '\t', '|']) {
            score += 1.0;
        }

        let text_lower = text.to_lowercase();
        let marker_hits = QUALITY_MARKERS
            .iter()
            .filter(|marker| text_lower.contains(**marker))
            .count();
        score += (marker_hits as f64 * 0.5).min(1.0);

        (score / 10.0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::entities::EntityExtractor;
    use chrono::Utc;

    fn customer(name: &str, email: Option<&str>, phone: Option<&str>) -> Customer {
        Customer {
            id: 1,
            name: name.into(),
            email: email.map(Into::into),
            phone: phone.map(Into::into),
        }
    }

    fn policy(number: &str) -> Policy {
        Policy {
            id: 1,
            policy_number: number.into(),
            customer_id: None,
            policy_type: Some("auto".into()),
            status: "active".into(),
        }
    }

    fn invoice(number: &str, amount: f64) -> Invoice {
        Invoice {
            id: 1,
            invoice_number: number.into(),
            customer_id: None,
            policy_id: None,
            amount,
            invoice_date: Utc::now(),
            due_date: None,
            status: "pending".into(),
        }
    }

    fn transaction(id: &str, amount: f64, reference: Option<&str>) -> Transaction {
        Transaction {
            id: 1,
            transaction_id: id.into(),
            invoice_id: None,
            customer_id: None,
            amount,
            transaction_date: Utc::now(),
            transaction_type: Some("payment".into()),
            payment_method: None,
            status: "completed".into(),
            reference_number: reference.map(Into::into),
        }
    }

    fn evaluate(text: &str, corpus: &ReferenceCorpus) -> Evaluation {
        let engine = ScoringEngine::default();
        let entities = EntityExtractor::new().extract(text);
        engine.evaluate(text, &entities, corpus)
    }

    // ── Customer matching ───────────────────────────────────────────

    #[test]
    fn customer_email_exact_match_scores_one() {
        let corpus = ReferenceCorpus {
            customers: vec![customer("John Smith", Some("john.smith@example.com"), None)],
            ..Default::default()
        };
        let eval = evaluate("Please contact john.smith@example.com today", &corpus);
        assert_eq!(eval.scores.customer_match, 1.0);
    }

    #[test]
    fn customer_salutation_partial_match() {
        let corpus = ReferenceCorpus {
            customers: vec![customer("John Smith", None, None)],
            ..Default::default()
        };
        let eval = evaluate("Dear John Smith, thank you for your payment.", &corpus);
        assert_eq!(eval.scores.customer_match, 1.0);
    }

    #[test]
    fn customer_phone_digit_only_match() {
        let corpus = ReferenceCorpus {
            customers: vec![customer("John Smith", None, Some("(555) 123-4567"))],
            ..Default::default()
        };
        let eval = evaluate("Call us back at 555-123-4567 any time", &corpus);
        assert_eq!(eval.scores.customer_match, 1.0);
    }

    #[test]
    fn customer_empty_corpus_scores_zero() {
        let corpus = ReferenceCorpus::default();
        let eval = evaluate("Dear John Smith, hello", &corpus);
        assert_eq!(eval.scores.customer_match, 0.0);
    }

    // ── Policy matching ─────────────────────────────────────────────

    #[test]
    fn verbatim_policy_number_scores_at_least_90() {
        // Scenario A: phone-free, email-free text with a verbatim number.
        let corpus = ReferenceCorpus {
            policies: vec![policy("POL123456789")],
            ..Default::default()
        };
        let eval = evaluate("Regarding policy POL123456789 renewal terms", &corpus);
        assert!(
            eval.scores.policy_match >= 0.90,
            "got {}",
            eval.scores.policy_match
        );
    }

    #[test]
    fn policy_keywords_alone_score_capped_at_half() {
        let corpus = ReferenceCorpus {
            policies: vec![policy("ZZZ0000000")],
            ..Default::default()
        };
        // 3 of 6 vocabulary terms, no number anywhere.
        let eval = evaluate("your coverage and premium for this claim", &corpus);
        assert_eq!(eval.scores.policy_match, 0.25);
    }

    #[test]
    fn policy_empty_corpus_scores_zero_even_with_keywords() {
        let corpus = ReferenceCorpus::default();
        let eval = evaluate("policy coverage premium claim deductible", &corpus);
        assert_eq!(eval.scores.policy_match, 0.0);
    }

    // ── Invoice reconciliation ──────────────────────────────────────

    #[test]
    fn exact_invoice_amount_scores_at_least_95_weighted() {
        // Scenario B: $1500.00 equals the stored invoice amount.
        let corpus = ReferenceCorpus {
            invoices: vec![invoice("INV-4021", 1500.00)],
            ..Default::default()
        };
        let eval = evaluate("Payment of $1500.00 enclosed", &corpus);
        assert!(
            eval.scores.invoice_reconciliation >= 0.38,
            "got {}",
            eval.scores.invoice_reconciliation
        );
    }

    #[test]
    fn amount_within_tolerance_scores_80() {
        let corpus = ReferenceCorpus {
            invoices: vec![invoice("INV-4021", 1000.00)],
            ..Default::default()
        };
        // 2% off — inside the 5% band, outside the exact band. No other
        // structural signals beyond the single amount.
        let eval = evaluate("$1020.00", &corpus);
        let expected = 0.80 * 0.4 + 0.1;
        assert!(
            (eval.scores.invoice_reconciliation - expected).abs() < 1e-9,
            "got {}",
            eval.scores.invoice_reconciliation
        );
    }

    #[test]
    fn verbatim_transaction_id_scores_90_weighted() {
        let corpus = ReferenceCorpus {
            transactions: vec![transaction("TXN-9001", 500.0, None)],
            ..Default::default()
        };
        let eval = evaluate("Confirming TXN-9001 went through", &corpus);
        // transaction component 0.9 × 0.3; "transaction"-vocabulary word
        // absent, no amounts, no dates.
        assert!(
            (eval.scores.invoice_reconciliation - 0.27).abs() < 1e-9,
            "got {}",
            eval.scores.invoice_reconciliation
        );
    }

    #[test]
    fn cross_validation_bonus_applies() {
        let corpus = ReferenceCorpus {
            invoices: vec![invoice("INV-4021", 1500.00)],
            transactions: vec![transaction("TXN-9001", 1500.00, Some("REF-555"))],
            ..Default::default()
        };
        let with_both = evaluate("Invoice INV-4021 settled by TXN-9001, $1500.00", &corpus);

        let invoices_only = ReferenceCorpus {
            invoices: corpus.invoices.clone(),
            ..Default::default()
        };
        let without = evaluate("Invoice INV-4021 settled by TXN-9001, $1500.00", &invoices_only);

        // Bonus (0.1) plus the transaction component separate the two.
        assert!(with_both.scores.invoice_reconciliation > without.scores.invoice_reconciliation);
        assert!(with_both.scores.invoice_reconciliation >= 0.38 + 0.27 + 0.1);
    }

    #[test]
    fn reconciliation_clamped_to_one() {
        let corpus = ReferenceCorpus {
            invoices: vec![invoice("INV-4021", 100.0)],
            transactions: vec![transaction("TXN-9001", 100.0, Some("REF-555"))],
            ..Default::default()
        };
        let text = "Invoice INV-4021 receipt: payment total $100.00 and $200.00 due 1/2/2024 \
                    via transaction TXN-9001 reference REF-555 balance paid";
        let eval = evaluate(text, &corpus);
        assert!(eval.scores.invoice_reconciliation <= 1.0);
    }

    #[test]
    fn zero_amount_invoice_does_not_divide_by_zero() {
        let corpus = ReferenceCorpus {
            invoices: vec![invoice("INV-0", 0.0)],
            ..Default::default()
        };
        let eval = evaluate("$500.00 charged", &corpus);
        assert!(eval.scores.invoice_reconciliation.is_finite());
    }

    // ── Data quality ────────────────────────────────────────────────

    #[test]
    fn data_quality_counts_all_buckets() {
        let corpus = ReferenceCorpus::default();
        let long_tail = "x".repeat(520);
        let text = format!(
            "Date: 12/31/2024\nAmount: $100.00\nFrom: a@b.com\n{long_tail}"
        );
        let engine = ScoringEngine::default();
        let entities = EntityExtractor::new().extract(&text);
        let eval = engine.evaluate(&text, &entities, &corpus);
        // dates 2 + amounts 2 + emails 1.5 + len>100 1.5 + len>500 1.0 +
        // structure 1.0 + markers capped 1.0 = 10 → 1.0
        assert_eq!(eval.scores.data_quality, 1.0);
    }

    #[test]
    fn data_quality_markers_capped() {
        let corpus = ReferenceCorpus::default();
        let engine = ScoringEngine::default();
        let text = "date: amount: total: from: to: subject:";
        let entities = EntityExtractor::new().extract(text);
        let eval = engine.evaluate(text, &entities, &corpus);
        // 6 markers × 0.5 capped at 1.0 → 1.0 of 10.
        assert_eq!(eval.scores.data_quality, 0.1);
    }

    // ── Composite ───────────────────────────────────────────────────

    #[test]
    fn empty_text_scores_zero_and_requires_review() {
        // Scenario C — even with a populated corpus.
        let corpus = ReferenceCorpus {
            customers: vec![customer("John Smith", Some("j@x.com"), Some("5551234567"))],
            policies: vec![policy("POL123456789")],
            invoices: vec![invoice("INV-4021", 1500.0)],
            transactions: vec![transaction("TXN-9001", 1500.0, None)],
        };
        let eval = evaluate("", &corpus);
        assert_eq!(eval.scores.customer_match, 0.0);
        assert_eq!(eval.scores.policy_match, 0.0);
        assert_eq!(eval.scores.invoice_reconciliation, 0.0);
        assert_eq!(eval.scores.data_quality, 0.0);
        assert_eq!(eval.scores.overall, 0.0);
        assert!(eval.requires_manual_review);
    }

    #[test]
    fn strong_document_clears_review() {
        let corpus = ReferenceCorpus {
            customers: vec![customer(
                "John Smith",
                Some("john.smith@example.com"),
                Some("5551234567"),
            )],
            policies: vec![policy("POL123456789")],
            invoices: vec![invoice("INV-4021", 1500.0)],
            transactions: vec![transaction("TXN-9001", 1500.0, Some("REF-555"))],
        };
        let text = "Date: 12/31/2024\nDear John Smith,\nYour policy POL123456789 premium \
                    invoice INV-4021 total $1500.00 was paid by transaction TXN-9001.\n\
                    From: john.smith@example.com";
        let eval = evaluate(text, &corpus);
        assert!(eval.scores.overall >= 0.8, "got {:?}", eval.scores);
        assert!(!eval.requires_manual_review);
    }

    // ── Signal extraction ───────────────────────────────────────────

    #[test]
    fn name_indicators_from_titles_and_labels() {
        let signals = SignalPatterns::new();
        let names = signals.name_indicators("Mr Smith and Dear Jane Doe, Name: Bob Jones");
        assert!(names.contains(&"Mr Smith".to_string()));
        assert!(names.contains(&"Jane Doe".to_string()));
        assert!(names.contains(&"Bob Jones".to_string()));
    }

    #[test]
    fn name_indicator_extends_to_three_words() {
        let signals = SignalPatterns::new();
        let names = signals.name_indicators("Mrs Mary Ann sent this");
        assert!(names.contains(&"Mrs Mary".to_string()));
        assert!(names.contains(&"Mrs Mary Ann".to_string()));
    }

    #[test]
    fn phone_tokens_require_seven_digits() {
        let signals = SignalPatterns::new();
        let tokens = signals.phone_tokens("call 555-123-4567 or ext 42");
        assert_eq!(tokens, vec!["5551234567"]);
    }

    #[test]
    fn policy_candidates_cover_all_families() {
        let signals = SignalPatterns::new();
        let candidates =
            signals.policy_number_candidates("POL123456789 or 123456789012 or P12345678");
        assert!(candidates.contains(&"POL123456789".to_string()));
        assert!(candidates.contains(&"123456789012".to_string()));
        assert!(candidates.contains(&"P12345678".to_string()));
    }

    #[test]
    fn invoice_candidates_cover_all_families() {
        let signals = SignalPatterns::new();
        let candidates = signals
            .invoice_number_candidates("INV-4021 or Invoice #556677 or 8899001122 or ABC123456");
        assert!(candidates.contains(&"INV-4021".to_string()));
        assert!(candidates.contains(&"556677".to_string()));
        assert!(candidates.contains(&"8899001122".to_string()));
        assert!(candidates.contains(&"ABC123456".to_string()));
    }

    #[test]
    fn parse_amount_handles_separators() {
        assert_eq!(parse_amount("1,500.00"), Some(1500.0));
        assert_eq!(parse_amount("42"), Some(42.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount(",,"), None);
    }
}
