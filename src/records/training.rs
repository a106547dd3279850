use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::{require_user, SessionService, UserId};
use crate::store::{self, KeyValueStore};

use super::compliance::record_error_response;
use super::RecordError;

/// Per-module completion state, keyed by module id under a single
/// per-user entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleProgress {
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveProgress {
    pub module_id: String,
    pub completed: bool,
    #[serde(default)]
    pub quiz_score: Option<u8>,
}

fn progress_key(owner: &UserId) -> String {
    format!("user:{}:training", owner.0)
}

pub struct TrainingService {
    store: Arc<dyn KeyValueStore>,
}

impl TrainingService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The owner's progress map; a user with no saved progress gets an
    /// empty map.
    pub fn progress(&self, owner: &UserId) -> Result<BTreeMap<String, ModuleProgress>, RecordError> {
        let progress = store::get_record(self.store.as_ref(), &progress_key(owner))?
            .unwrap_or_default();
        Ok(progress)
    }

    /// Upsert one module's progress. The whole map lives under one key,
    /// so the insert goes through the store's atomic update.
    pub fn save(&self, owner: &UserId, save: SaveProgress) -> Result<ModuleProgress, RecordError> {
        let progress = ModuleProgress {
            completed: save.completed,
            quiz_score: save.quiz_score,
            completed_at: save.completed.then(Utc::now),
        };
        let encoded = serde_json::to_value(&progress).map_err(store::StoreError::from)?;

        self.store.update(&progress_key(owner), &mut |current| {
            let mut map = match current {
                Some(Value::Object(map)) => map,
                _ => serde_json::Map::new(),
            };
            map.insert(save.module_id.clone(), encoded.clone());
            Value::Object(map)
        })?;
        Ok(progress)
    }
}

/// Shared state for the training endpoints.
#[derive(Clone)]
pub struct TrainingApi {
    pub sessions: Arc<SessionService>,
    pub service: Arc<TrainingService>,
}

pub fn training_router(api: TrainingApi) -> Router {
    Router::new()
        .route(
            "/api/v1/training/progress",
            get(progress_handler).post(save_handler),
        )
        .with_state(api)
}

async fn progress_handler(State(api): State<TrainingApi>, headers: HeaderMap) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.progress(&profile.id) {
        Ok(progress) => (StatusCode::OK, Json(json!({ "progress": progress }))).into_response(),
        Err(error) => record_error_response(error),
    }
}

async fn save_handler(
    State(api): State<TrainingApi>,
    headers: HeaderMap,
    Json(save): Json<SaveProgress>,
) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    let module_id = save.module_id.clone();
    match api.service.save(&profile.id, save) {
        Ok(progress) => (
            StatusCode::OK,
            Json(json!({ "module_id": module_id, "progress": progress })),
        )
            .into_response(),
        Err(error) => record_error_response(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn save_then_reload_keeps_every_module() {
        let service = TrainingService::new(Arc::new(MemoryStore::default()));
        let owner = UserId("user-1".to_string());

        service
            .save(
                &owner,
                SaveProgress {
                    module_id: "biosecurity-basics".to_string(),
                    completed: true,
                    quiz_score: Some(90),
                },
            )
            .expect("save");
        service
            .save(
                &owner,
                SaveProgress {
                    module_id: "disease-prevention".to_string(),
                    completed: false,
                    quiz_score: None,
                },
            )
            .expect("save");

        let progress = service.progress(&owner).expect("progress");
        assert_eq!(progress.len(), 2);
        assert!(progress["biosecurity-basics"].completed);
        assert_eq!(progress["biosecurity-basics"].quiz_score, Some(90));
        assert!(progress["biosecurity-basics"].completed_at.is_some());
        assert!(!progress["disease-prevention"].completed);
        assert!(progress["disease-prevention"].completed_at.is_none());
    }

    #[test]
    fn resaving_a_module_overwrites_its_entry() {
        let service = TrainingService::new(Arc::new(MemoryStore::default()));
        let owner = UserId("user-1".to_string());

        service
            .save(
                &owner,
                SaveProgress {
                    module_id: "biosecurity-basics".to_string(),
                    completed: false,
                    quiz_score: Some(40),
                },
            )
            .expect("save");
        service
            .save(
                &owner,
                SaveProgress {
                    module_id: "biosecurity-basics".to_string(),
                    completed: true,
                    quiz_score: Some(85),
                },
            )
            .expect("save");

        let progress = service.progress(&owner).expect("progress");
        assert_eq!(progress.len(), 1);
        assert_eq!(progress["biosecurity-basics"].quiz_score, Some(85));
        assert!(progress["biosecurity-basics"].completed);
    }

    #[test]
    fn fresh_user_has_empty_progress() {
        let service = TrainingService::new(Arc::new(MemoryStore::default()));
        let owner = UserId("user-9".to_string());
        assert!(service.progress(&owner).expect("progress").is_empty());
    }
}
