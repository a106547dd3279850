use std::sync::Arc;

use crate::auth::UserId;
use crate::store::{self, KeyValueStore, StoreError};

use super::domain::{Assessment, AssessmentId};

/// Storage abstraction so the service and router can be exercised in
/// isolation. Assessments are append-only; there is deliberately no update
/// or delete operation (audit-trail semantics).
pub trait AssessmentRepository: Send + Sync {
    fn append(&self, assessment: Assessment) -> Result<Assessment, RepositoryError>;
    /// The owner's assessments, most recent first.
    fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Assessment>, RepositoryError>;
    /// Every stored assessment, for the analytics scan.
    fn list_all(&self) -> Result<Vec<Assessment>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("assessment already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Repository over the key-value boundary. The record is written under
/// `assessment:{id}` and the id appended to the owner's index through the
/// store's atomic `update`, so concurrent submissions cannot drop an id.
pub struct KvAssessmentRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvAssessmentRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn record_key(id: &AssessmentId) -> String {
        format!("assessment:{}", id.0)
    }

    fn index_key(owner: &UserId) -> String {
        format!("user:{}:assessments", owner.0)
    }
}

impl AssessmentRepository for KvAssessmentRepository {
    fn append(&self, assessment: Assessment) -> Result<Assessment, RepositoryError> {
        let key = Self::record_key(&assessment.id);
        let value = serde_json::to_value(&assessment).map_err(StoreError::from)?;
        if !self.store.set_if_absent(&key, value)? {
            return Err(RepositoryError::Conflict);
        }
        store::push_index(
            self.store.as_ref(),
            &Self::index_key(&assessment.owner_id),
            &assessment.id.0,
        )?;
        Ok(assessment)
    }

    fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Assessment>, RepositoryError> {
        let ids = store::read_index(self.store.as_ref(), &Self::index_key(owner))?;
        let mut assessments = Vec::with_capacity(ids.len());
        for id in ids {
            let key = Self::record_key(&AssessmentId(id));
            if let Some(assessment) = store::get_record(self.store.as_ref(), &key)? {
                assessments.push(assessment);
            }
        }
        assessments.reverse();
        Ok(assessments)
    }

    fn list_all(&self) -> Result<Vec<Assessment>, RepositoryError> {
        let mut assessments = Vec::new();
        for (_, value) in self.store.list_by_prefix("assessment:")? {
            let assessment: Assessment =
                serde_json::from_value(value).map_err(StoreError::from)?;
            assessments.push(assessment);
        }
        Ok(assessments)
    }
}
