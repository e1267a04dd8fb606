//! Review routing — overall score to workflow status.

use crate::config::RoutingThresholds;
use crate::store::models::DocumentStatus;

/// Maps a scored document to its next lifecycle state.
///
/// Thresholds live on the [0,1] scale throughout; only the rendered
/// notification shows the 0–10 display scale.
#[derive(Debug, Clone, Copy)]
pub struct ReviewRouter {
    thresholds: RoutingThresholds,
}

impl Default for ReviewRouter {
    fn default() -> Self {
        Self::new(RoutingThresholds::default())
    }
}

impl ReviewRouter {
    pub fn new(thresholds: RoutingThresholds) -> Self {
        Self { thresholds }
    }

    /// Route an overall score to a status. Both boundaries are inclusive.
    pub fn route(&self, overall: f64) -> DocumentStatus {
        if overall >= self.thresholds.auto_approve {
            DocumentStatus::AutoApproved
        } else if overall >= self.thresholds.quick_review {
            DocumentStatus::QuickReview
        } else {
            DocumentStatus::ManualReview
        }
    }
}
