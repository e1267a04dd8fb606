//! Document scoring — fuzzy matching against the reference corpus.

pub mod audit;
pub mod engine;
pub mod service;
pub mod types;

pub use engine::ScoringEngine;
pub use service::AnalysisService;
pub use types::{AnalysisOutcome, Evaluation, ReviewPolicy, ScoreSet, ScoreWeights};
