//! Biosecurity risk assessments: question catalogs, the scoring engine,
//! the append-only record store, and the HTTP surface.

pub mod catalog;
pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::{Catalog, Question, PIG_CATALOG, POULTRY_CATALOG};
pub use domain::{AnswerSet, Assessment, AssessmentId, RiskTier};
pub use repository::{AssessmentRepository, KvAssessmentRepository, RepositoryError};
pub use router::{assessment_router, AssessmentApi};
pub use scoring::{score, ScoreReport, ScoringError};
pub use service::{AssessmentError, AssessmentService};
