use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::auth::{FarmType, UserId};

use super::catalog::Catalog;
use super::domain::{AnswerSet, Assessment, AssessmentId};
use super::repository::{AssessmentRepository, RepositoryError};
use super::scoring::{self, ScoringError};

static ASSESSMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_assessment_id() -> AssessmentId {
    let seq = ASSESSMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssessmentId(format!("{}-{seq:06}", Utc::now().timestamp_millis()))
}

/// Service composing the catalog lookup, scoring engine, and repository.
pub struct AssessmentService<R> {
    repository: Arc<R>,
}

impl<R> AssessmentService<R>
where
    R: AssessmentRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Score a completed answer set and append the resulting assessment.
    /// Either the whole record is created or nothing is.
    pub fn submit(
        &self,
        owner: &UserId,
        farm_type: FarmType,
        answers: AnswerSet,
    ) -> Result<Assessment, AssessmentError> {
        let catalog =
            Catalog::for_farm_type(farm_type).ok_or(ScoringError::InvalidCatalog)?;
        let report = scoring::score(&answers, catalog)?;

        let assessment = Assessment {
            id: next_assessment_id(),
            owner_id: owner.clone(),
            farm_type,
            answers,
            compliance_score: report.compliance_score,
            risk_score: report.risk_score,
            risk_tier: report.risk_tier,
            created_at: Utc::now(),
        };

        Ok(self.repository.append(assessment)?)
    }

    /// The caller's assessments, most recent first.
    pub fn list(&self, owner: &UserId) -> Result<Vec<Assessment>, AssessmentError> {
        Ok(self.repository.list_by_owner(owner)?)
    }

    /// Every stored assessment, for the analytics scan.
    pub fn list_all(&self) -> Result<Vec<Assessment>, AssessmentError> {
        Ok(self.repository.list_all()?)
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
