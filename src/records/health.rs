use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{require_user, SessionService, UserId};
use crate::store::{self, KeyValueStore};

use super::compliance::record_error_response;
use super::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Vaccination,
    Medication,
    Checkup,
    Treatment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Completed,
    Scheduled,
    Overdue,
}

/// Animal-batch health entry. Unlike assessments these are editable;
/// update and delete are owner-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: String,
    pub owner_id: UserId,
    pub batch_name: String,
    pub kind: RecordKind,
    pub date: NaiveDate,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub veterinarian: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due: Option<NaiveDate>,
    pub status: HealthStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHealthRecord {
    pub batch_name: String,
    pub kind: RecordKind,
    pub date: NaiveDate,
    pub details: String,
    #[serde(default)]
    pub veterinarian: Option<String>,
    #[serde(default)]
    pub next_due: Option<NaiveDate>,
    pub status: HealthStatus,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthRecordUpdate {
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub status: Option<HealthStatus>,
    #[serde(default)]
    pub next_due: Option<NaiveDate>,
}

static HEALTH_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_record_id() -> String {
    let seq = HEALTH_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("health-{}-{seq:04}", Utc::now().timestamp_millis())
}

fn record_key(id: &str) -> String {
    format!("health-record:{id}")
}

fn index_key(owner: &UserId) -> String {
    format!("user:{}:health-records", owner.0)
}

pub struct HealthService {
    store: Arc<dyn KeyValueStore>,
}

impl HealthService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        owner: &UserId,
        record: NewHealthRecord,
    ) -> Result<HealthRecord, RecordError> {
        let record = HealthRecord {
            id: next_record_id(),
            owner_id: owner.clone(),
            batch_name: record.batch_name,
            kind: record.kind,
            date: record.date,
            details: record.details,
            veterinarian: record.veterinarian,
            next_due: record.next_due,
            status: record.status,
            created_at: Utc::now(),
            updated_at: None,
        };

        store::put_record(self.store.as_ref(), &record_key(&record.id), &record)?;
        store::push_index(self.store.as_ref(), &index_key(owner), &record.id)?;
        Ok(record)
    }

    pub fn list(&self, owner: &UserId) -> Result<Vec<HealthRecord>, RecordError> {
        let ids = store::read_index(self.store.as_ref(), &index_key(owner))?;
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = store::get_record(self.store.as_ref(), &record_key(&id))? {
                records.push(record);
            }
        }
        records.reverse();
        Ok(records)
    }

    /// Owner-checked partial update.
    pub fn update(
        &self,
        owner: &UserId,
        id: &str,
        update: HealthRecordUpdate,
    ) -> Result<HealthRecord, RecordError> {
        let mut record: HealthRecord =
            store::get_record(self.store.as_ref(), &record_key(id))?
                .filter(|record: &HealthRecord| &record.owner_id == owner)
                .ok_or(RecordError::NotFound)?;

        if let Some(details) = update.details {
            record.details = details;
        }
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(next_due) = update.next_due {
            record.next_due = Some(next_due);
        }
        record.updated_at = Some(Utc::now());

        store::put_record(self.store.as_ref(), &record_key(id), &record)?;
        Ok(record)
    }

    /// Owner-checked delete; the id is also dropped from the index.
    pub fn delete(&self, owner: &UserId, id: &str) -> Result<(), RecordError> {
        let record: Option<HealthRecord> =
            store::get_record(self.store.as_ref(), &record_key(id))?;
        match record {
            Some(record) if &record.owner_id == owner => {
                self.store.delete(&record_key(id))?;
                store::remove_from_index(self.store.as_ref(), &index_key(owner), id)?;
                Ok(())
            }
            _ => Err(RecordError::NotFound),
        }
    }
}

/// Shared state for the health-record endpoints.
#[derive(Clone)]
pub struct HealthApi {
    pub sessions: Arc<SessionService>,
    pub service: Arc<HealthService>,
}

pub fn health_router(api: HealthApi) -> Router {
    Router::new()
        .route(
            "/api/v1/health-records",
            get(list_handler).post(create_handler),
        )
        .route(
            "/api/v1/health-records/:record_id",
            axum::routing::put(update_handler).delete(delete_handler),
        )
        .with_state(api)
}

async fn create_handler(
    State(api): State<HealthApi>,
    headers: HeaderMap,
    Json(record): Json<NewHealthRecord>,
) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.create(&profile.id, record) {
        Ok(record) => (StatusCode::CREATED, Json(json!({ "record": record }))).into_response(),
        Err(error) => record_error_response(error),
    }
}

async fn list_handler(State(api): State<HealthApi>, headers: HeaderMap) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.list(&profile.id) {
        Ok(records) => (StatusCode::OK, Json(json!({ "records": records }))).into_response(),
        Err(error) => record_error_response(error),
    }
}

async fn update_handler(
    State(api): State<HealthApi>,
    headers: HeaderMap,
    Path(record_id): Path<String>,
    Json(update): Json<HealthRecordUpdate>,
) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.update(&profile.id, &record_id, update) {
        Ok(record) => (StatusCode::OK, Json(json!({ "record": record }))).into_response(),
        Err(error) => record_error_response(error),
    }
}

async fn delete_handler(
    State(api): State<HealthApi>,
    headers: HeaderMap,
    Path(record_id): Path<String>,
) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.delete(&profile.id, &record_id) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(error) => record_error_response(error),
    }
}
