//! Pure scoring over a completed answer set.
//!
//! Polarity convention (applied identically on the write path and in
//! analytics): more yes answers mean lower risk. The risk score is the
//! share of negative answers, the compliance score its complement, and the
//! tier comes from [`RiskTier::from_risk_score`]. The tier stored on an
//! assessment at write time is the one analytics counts later, so the two
//! paths cannot drift apart.

use super::catalog::Catalog;
use super::domain::{AnswerSet, RiskTier};
use serde::Serialize;

/// Result of scoring one answer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    pub compliance_score: u8,
    pub risk_score: u8,
    pub risk_tier: RiskTier,
}

/// Error enumeration for scoring failures. Completeness is validated by
/// the caller as well, but the engine rejects partial sets rather than
/// silently averaging over them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("no question catalog is defined for this assessment")]
    InvalidCatalog,
    #[error("answer set is incomplete: expected {expected} answers, got {actual}")]
    IncompleteAnswerSet { expected: usize, actual: usize },
    #[error("answer references unknown question '{id}'")]
    UnknownQuestion { id: String },
}

/// Score a complete answer set against its catalog.
pub fn score(answers: &AnswerSet, catalog: &Catalog) -> Result<ScoreReport, ScoringError> {
    let total = catalog.len();
    if total == 0 {
        return Err(ScoringError::InvalidCatalog);
    }
    if answers.len() != total {
        return Err(ScoringError::IncompleteAnswerSet {
            expected: total,
            actual: answers.len(),
        });
    }
    if let Some(id) = answers.keys().find(|id| !catalog.contains(id)) {
        return Err(ScoringError::UnknownQuestion { id: id.clone() });
    }

    let positive = answers.values().filter(|answer| **answer).count();
    let risk_score = (((total - positive) as f64 / total as f64) * 100.0).round() as u8;

    Ok(ScoreReport {
        compliance_score: 100 - risk_score,
        risk_score,
        risk_tier: RiskTier::from_risk_score(risk_score),
    })
}
