use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
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

use super::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceKind {
    Vaccination,
    Inspection,
    Sanitation,
}

/// Owned compliance entry; create appends, list filters by owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    pub id: String,
    pub owner_id: UserId,
    pub kind: ComplianceKind,
    pub date: NaiveDate,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComplianceRecord {
    pub kind: ComplianceKind,
    pub date: NaiveDate,
    pub details: String,
}

static COMPLIANCE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_record_id() -> String {
    let seq = COMPLIANCE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("compliance-{}-{seq:04}", Utc::now().timestamp_millis())
}

fn record_key(id: &str) -> String {
    format!("compliance:{id}")
}

fn index_key(owner: &UserId) -> String {
    format!("user:{}:compliance", owner.0)
}

pub struct ComplianceService {
    store: Arc<dyn KeyValueStore>,
}

impl ComplianceService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        owner: &UserId,
        record: NewComplianceRecord,
    ) -> Result<ComplianceRecord, RecordError> {
        let record = ComplianceRecord {
            id: next_record_id(),
            owner_id: owner.clone(),
            kind: record.kind,
            date: record.date,
            details: record.details,
            created_at: Utc::now(),
        };

        store::put_record(self.store.as_ref(), &record_key(&record.id), &record)?;
        store::push_index(self.store.as_ref(), &index_key(owner), &record.id)?;
        Ok(record)
    }

    /// The owner's records, most recent first.
    pub fn list(&self, owner: &UserId) -> Result<Vec<ComplianceRecord>, RecordError> {
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
}

/// Shared state for the compliance endpoints.
#[derive(Clone)]
pub struct ComplianceApi {
    pub sessions: Arc<SessionService>,
    pub service: Arc<ComplianceService>,
}

pub fn compliance_router(api: ComplianceApi) -> Router {
    Router::new()
        .route(
            "/api/v1/compliance",
            get(list_handler).post(create_handler),
        )
        .with_state(api)
}

async fn create_handler(
    State(api): State<ComplianceApi>,
    headers: HeaderMap,
    Json(record): Json<NewComplianceRecord>,
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

async fn list_handler(State(api): State<ComplianceApi>, headers: HeaderMap) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.list(&profile.id) {
        Ok(records) => (StatusCode::OK, Json(json!({ "records": records }))).into_response(),
        Err(error) => record_error_response(error),
    }
}

pub(super) fn record_error_response(error: RecordError) -> Response {
    let status = match error {
        RecordError::NotFound => StatusCode::NOT_FOUND,
        RecordError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
