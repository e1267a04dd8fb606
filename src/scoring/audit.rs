//! Matched-record audit trail.
//!
//! Reports which corpus records a document matched and why. This is a
//! side-channel for reviewers — the composite score never reads it.

use crate::extract::entities::ExtractedEntities;
use crate::matching::{self, ACCEPT_THRESHOLD};
use crate::scoring::engine::{SignalPatterns, parse_amount};
use crate::scoring::types::{
    MatchedCustomer, MatchedInvoice, MatchedPolicy, MatchedRecords, MatchedTransaction,
};
use crate::store::traits::ReferenceCorpus;

/// Collect every record whose best match score exceeds the accept
/// threshold, with human-readable reasons per triggering signal.
pub fn matched_records(
    text: &str,
    entities: &ExtractedEntities,
    corpus: &ReferenceCorpus,
) -> MatchedRecords {
    let signals = SignalPatterns::new();
    let text_lower = text.to_lowercase();

    let indicators = signals.name_indicators(text);
    let emails: Vec<String> = entities.emails.iter().map(|e| e.to_lowercase()).collect();
    let policy_candidates = signals.policy_number_candidates(text);
    let amounts: Vec<f64> = entities
        .amounts
        .iter()
        .filter_map(|raw| parse_amount(raw))
        .collect();

    let mut matched = MatchedRecords::default();

    for customer in &corpus.customers {
        let mut score = 0u32;
        let mut reasons = Vec::new();
        let name_lower = customer.name.to_lowercase();

        for indicator in &indicators {
            let name_score = matching::partial_ratio(&indicator.to_lowercase(), &name_lower);
            if name_score > ACCEPT_THRESHOLD {
                score = score.max(name_score);
                reasons.push(format!("Name match: {indicator}"));
            }
        }

        if let Some(ref customer_email) = customer.email {
            let customer_email_lower = customer_email.to_lowercase();
            for email in &emails {
                let email_score = matching::ratio(email, &customer_email_lower);
                if email_score > 80 {
                    score = score.max(email_score);
                    reasons.push(format!("Email match: {email}"));
                }
            }
        }

        if score > ACCEPT_THRESHOLD {
            matched.customers.push(MatchedCustomer {
                id: customer.id,
                name: customer.name.clone(),
                email: customer.email.clone(),
                match_score: score,
                match_reasons: reasons,
            });
        }
    }

    for policy in &corpus.policies {
        let mut score = 0u32;
        let mut reasons = Vec::new();

        for candidate in &policy_candidates {
            let number_score = matching::ratio(candidate, &policy.policy_number);
            if number_score > ACCEPT_THRESHOLD {
                score = score.max(number_score);
                reasons.push(format!("Policy number match: {candidate}"));
            }
        }

        if text_lower.contains(&policy.policy_number.to_lowercase()) {
            score = score.max(90);
            reasons.push(format!("Direct policy mention: {}", policy.policy_number));
        }

        if score > ACCEPT_THRESHOLD {
            matched.policies.push(MatchedPolicy {
                id: policy.id,
                policy_number: policy.policy_number.clone(),
                policy_type: policy.policy_type.clone(),
                match_score: score,
                match_reasons: reasons,
            });
        }
    }

    for invoice in &corpus.invoices {
        let mut score = 0u32;
        let mut reasons = Vec::new();

        if text_lower.contains(&invoice.invoice_number.to_lowercase()) {
            score = score.max(95);
            reasons.push(format!("Invoice number match: {}", invoice.invoice_number));
        }

        for &amount in &amounts {
            if (amount - invoice.amount).abs() < 0.01 {
                score = score.max(95);
                reasons.push(format!("Exact amount match: ${:.2}", invoice.amount));
            } else if invoice.amount != 0.0
                && ((amount - invoice.amount) / invoice.amount).abs() < 0.05
            {
                score = score.max(80);
                reasons.push(format!("Close amount match: ${:.2}", invoice.amount));
            }
        }

        if score > ACCEPT_THRESHOLD {
            matched.invoices.push(MatchedInvoice {
                id: invoice.id,
                invoice_number: invoice.invoice_number.clone(),
                amount: invoice.amount,
                customer_id: invoice.customer_id,
                match_score: score,
                match_reasons: reasons,
            });
        }
    }

    for transaction in &corpus.transactions {
        let mut score = 0u32;
        let mut reasons = Vec::new();

        if text_lower.contains(&transaction.transaction_id.to_lowercase()) {
            score = score.max(90);
            reasons.push(format!("Transaction ID match: {}", transaction.transaction_id));
        }

        if let Some(ref reference) = transaction.reference_number
            && text_lower.contains(&reference.to_lowercase())
        {
            score = score.max(85);
            reasons.push(format!("Reference match: {reference}"));
        }

        for &amount in &amounts {
            if (amount - transaction.amount).abs() < 0.01 {
                score = score.max(90);
                reasons.push(format!("Exact amount match: ${:.2}", transaction.amount));
            }
        }

        if score > ACCEPT_THRESHOLD {
            matched.transactions.push(MatchedTransaction {
                id: transaction.id,
                transaction_id: transaction.transaction_id.clone(),
                amount: transaction.amount,
                transaction_type: transaction.transaction_type.clone(),
                match_score: score,
                match_reasons: reasons,
            });
        }
    }

    matched
}
