use std::sync::Arc;

use crate::assessment::catalog::Catalog;
use crate::assessment::domain::{AnswerSet, Assessment};
use crate::assessment::repository::{
    AssessmentRepository, KvAssessmentRepository, RepositoryError,
};
use crate::assessment::router::{assessment_router, AssessmentApi};
use crate::assessment::service::AssessmentService;
use crate::auth::{FarmType, NewUser, Role, SessionService, UserId, UserProfile};
use crate::store::MemoryStore;

/// Answer set over `catalog` with the first `yes` questions answered true
/// and the rest false.
pub(super) fn answers_with_yes(catalog: &Catalog, yes: usize) -> AnswerSet {
    catalog
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| (question.id.to_string(), index < yes))
        .collect()
}

pub(super) struct TestEnv {
    pub(super) sessions: Arc<SessionService>,
    pub(super) service: Arc<AssessmentService<KvAssessmentRepository>>,
}

pub(super) fn test_env() -> TestEnv {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::default());
    let sessions = Arc::new(SessionService::new(store.clone()));
    let repository = Arc::new(KvAssessmentRepository::new(store));
    let service = Arc::new(AssessmentService::new(repository));
    TestEnv { sessions, service }
}

pub(super) fn register_farmer(env: &TestEnv) -> (UserProfile, String) {
    env.sessions
        .register(NewUser {
            email: "farmer@example.com".to_string(),
            password: "password123".to_string(),
            name: "Rajesh Kumar".to_string(),
            role: Role::Farmer,
            farm_type: Some(FarmType::Poultry),
            location: "Bangalore, Karnataka".to_string(),
            language: "en".to_string(),
        })
        .expect("registration succeeds")
}

pub(super) fn router_for(env: &TestEnv) -> axum::Router {
    assessment_router(AssessmentApi {
        sessions: env.sessions.clone(),
        service: env.service.clone(),
    })
}

pub(super) struct UnavailableRepository;

impl AssessmentRepository for UnavailableRepository {
    fn append(&self, _assessment: Assessment) -> Result<Assessment, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn list_by_owner(&self, _owner: &UserId) -> Result<Vec<Assessment>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn list_all(&self) -> Result<Vec<Assessment>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}
