//! Score and audit-trail types.

use serde::{Deserialize, Serialize};

/// The four sub-scores plus the weighted overall, all in [0,1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub customer_match: f64,
    pub policy_match: f64,
    pub invoice_reconciliation: f64,
    pub data_quality: f64,
    pub overall: f64,
}

/// Weights for the composite score. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub customer: f64,
    pub policy: f64,
    pub reconciliation: f64,
    pub quality: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            customer: 0.3,
            policy: 0.3,
            reconciliation: 0.2,
            quality: 0.2,
        }
    }
}

impl ScoreWeights {
    /// Weighted overall score for the four sub-scores.
    pub fn overall(
        &self,
        customer: f64,
        policy: f64,
        reconciliation: f64,
        quality: f64,
    ) -> f64 {
        customer * self.customer
            + policy * self.policy
            + reconciliation * self.reconciliation
            + quality * self.quality
    }
}

/// Floors below which a document always needs manual review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewPolicy {
    /// Overall scores below this require review (strict `<`).
    pub overall_floor: f64,
    pub customer_floor: f64,
    pub policy_floor: f64,
    pub quality_floor: f64,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            overall_floor: 0.6,
            customer_floor: 0.3,
            policy_floor: 0.3,
            quality_floor: 0.4,
        }
    }
}

impl ReviewPolicy {
    /// Whether a score set requires human review.
    ///
    /// Derived from the scores alone — never set independently. All
    /// boundaries are strict, so a score exactly at a floor passes.
    pub fn requires_manual_review(&self, scores: &ScoreSet) -> bool {
        scores.overall < self.overall_floor
            || scores.customer_match < self.customer_floor
            || scores.policy_match < self.policy_floor
            || scores.data_quality < self.quality_floor
    }
}

/// Result of one scoring pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub scores: ScoreSet,
    pub requires_manual_review: bool,
}

/// Response of the analysis boundary for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub document_id: i64,
    pub scores: ScoreSet,
    pub requires_manual_review: bool,
    pub matched_records: MatchedRecords,
}

// ── Audit trail ─────────────────────────────────────────────────────

/// Records whose best match score exceeded the accept threshold, with the
/// sub-signals that triggered them. Reporting side-channel only — never an
/// input to score computation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchedRecords {
    pub customers: Vec<MatchedCustomer>,
    pub policies: Vec<MatchedPolicy>,
    pub invoices: Vec<MatchedInvoice>,
    pub transactions: Vec<MatchedTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedCustomer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub match_score: u32,
    pub match_reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedPolicy {
    pub id: i64,
    pub policy_number: String,
    pub policy_type: Option<String>,
    pub match_score: u32,
    pub match_reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedInvoice {
    pub id: i64,
    pub invoice_number: String,
    pub amount: f64,
    pub customer_id: Option<i64>,
    pub match_score: u32,
    pub match_reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedTransaction {
    pub id: i64,
    pub transaction_id: String,
    pub amount: f64,
    pub transaction_type: Option<String>,
    pub match_score: u32,
    pub match_reasons: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let w = ScoreWeights::default();
        let sum = w.customer + w.policy + w.reconciliation + w.quality;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn overall_is_exact_weighted_sum() {
        let w = ScoreWeights::default();
        // Synthetic sub-scores from {0, 0.5, 1}.
        assert_eq!(w.overall(0.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(w.overall(1.0, 1.0, 1.0, 1.0), 1.0);
        assert_eq!(w.overall(1.0, 0.0, 0.0, 0.0), 0.3);
        assert_eq!(w.overall(0.0, 1.0, 0.0, 0.0), 0.3);
        assert_eq!(w.overall(0.0, 0.0, 1.0, 0.0), 0.2);
        assert_eq!(w.overall(0.0, 0.0, 0.0, 1.0), 0.2);
        assert_eq!(w.overall(0.5, 0.5, 0.5, 0.5), 0.5);
        assert_eq!(w.overall(1.0, 0.5, 0.0, 1.0), 0.3 + 0.15 + 0.2);
    }

    #[test]
    fn review_boundary_is_strict() {
        let policy = ReviewPolicy::default();
        // Exactly at every floor — passes (boundaries are `<`, not `<=`).
        let at_floors = ScoreSet {
            customer_match: 0.3,
            policy_match: 0.3,
            invoice_reconciliation: 0.0,
            data_quality: 0.4,
            overall: 0.6,
        };
        assert!(!policy.requires_manual_review(&at_floors));

        let just_below = ScoreSet {
            overall: 0.5999,
            ..at_floors
        };
        assert!(policy.requires_manual_review(&just_below));
    }

    #[test]
    fn any_floor_violation_forces_review() {
        let policy = ReviewPolicy::default();
        let good = ScoreSet {
            customer_match: 0.9,
            policy_match: 0.9,
            invoice_reconciliation: 0.9,
            data_quality: 0.9,
            overall: 0.9,
        };
        assert!(!policy.requires_manual_review(&good));

        for (c, p, q) in [(0.2, 0.9, 0.9), (0.9, 0.2, 0.9), (0.9, 0.9, 0.3)] {
            let scores = ScoreSet {
                customer_match: c,
                policy_match: p,
                data_quality: q,
                ..good
            };
            assert!(policy.requires_manual_review(&scores));
        }
    }

    #[test]
    fn review_flag_is_monotone_in_sub_scores() {
        let policy = ReviewPolicy::default();
        let weights = ScoreWeights::default();
        let grid = [0.0, 0.5, 1.0];

        for &c in &grid {
            for &p in &grid {
                for &r in &grid {
                    for &q in &grid {
                        let base = ScoreSet {
                            customer_match: c,
                            policy_match: p,
                            invoice_reconciliation: r,
                            data_quality: q,
                            overall: weights.overall(c, p, r, q),
                        };
                        if policy.requires_manual_review(&base) {
                            continue;
                        }
                        // Raising any one sub-score must never flip false→true.
                        for bump in 0..4 {
                            let mut raised = base;
                            match bump {
                                0 => raised.customer_match = 1.0,
                                1 => raised.policy_match = 1.0,
                                2 => raised.invoice_reconciliation = 1.0,
                                _ => raised.data_quality = 1.0,
                            }
                            raised.overall = weights.overall(
                                raised.customer_match,
                                raised.policy_match,
                                raised.invoice_reconciliation,
                                raised.data_quality,
                            );
                            assert!(
                                !policy.requires_manual_review(&raised),
                                "raising a sub-score flipped review to true from {base:?}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn reconciliation_has_no_floor() {
        let policy = ReviewPolicy::default();
        let scores = ScoreSet {
            customer_match: 0.9,
            policy_match: 0.9,
            invoice_reconciliation: 0.0,
            data_quality: 0.9,
            overall: 0.72,
        };
        assert!(!policy.requires_manual_review(&scores));
    }

    #[test]
    fn score_set_serializes_named_fields() {
        let scores = ScoreSet {
            customer_match: 0.5,
            ..Default::default()
        };
        let json = serde_json::to_string(&scores).unwrap();
        assert!(json.contains("\"customer_match\":0.5"));
        assert!(json.contains("\"overall\""));
    }
}
