//! Shared disease alerts: vets and authorities publish, everyone reads.
//! Clients obtain updates by re-reading the list on a fixed interval;
//! there is no push channel.

use std::sync::atomic::{AtomicU64, Ordering};
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
use serde_json::json;

use crate::auth::{require_user, FarmType, SessionService, UserId};
use crate::store::{self, KeyValueStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Published disease alert. Two concurrent publishers are both accepted;
/// the only ordering is the append order of the active index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_type: Option<FarmType>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAlert {
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub farm_type: Option<FarmType>,
}

/// Error raised by the alert service.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("only vets and authorities can create alerts")]
    Forbidden,
    #[error(transparent)]
    Storage(#[from] StoreError),
}

static ALERT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_alert_id() -> AlertId {
    let seq = ALERT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AlertId(format!("alert-{}-{seq:04}", Utc::now().timestamp_millis()))
}

fn record_key(id: &AlertId) -> String {
    format!("alert:{}", id.0)
}

const ACTIVE_INDEX: &str = "alerts:active";

pub struct AlertService {
    store: Arc<dyn KeyValueStore>,
}

impl AlertService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Publish an alert on behalf of `author`. Role-gated.
    pub fn publish(
        &self,
        author_id: &UserId,
        author_role: crate::auth::Role,
        new_alert: NewAlert,
    ) -> Result<Alert, AlertError> {
        if !author_role.can_publish_alerts() {
            return Err(AlertError::Forbidden);
        }

        let alert = Alert {
            id: next_alert_id(),
            title: new_alert.title,
            description: new_alert.description,
            severity: new_alert.severity,
            location: new_alert.location,
            farm_type: new_alert.farm_type,
            created_by: author_id.clone(),
            created_at: Utc::now(),
            active: true,
        };

        store::put_record(self.store.as_ref(), &record_key(&alert.id), &alert)?;
        store::push_index(self.store.as_ref(), ACTIVE_INDEX, &alert.id.0)?;
        Ok(alert)
    }

    /// Active alerts, newest first. This is the list clients poll.
    pub fn list_active(&self) -> Result<Vec<Alert>, AlertError> {
        let ids = store::read_index(self.store.as_ref(), ACTIVE_INDEX)?;
        let mut alerts = Vec::with_capacity(ids.len());
        for id in ids {
            let key = record_key(&AlertId(id));
            if let Some(alert) = store::get_record::<Alert>(self.store.as_ref(), &key)? {
                if alert.active {
                    alerts.push(alert);
                }
            }
        }
        alerts.reverse();
        Ok(alerts)
    }

    pub fn active_count(&self) -> Result<usize, AlertError> {
        Ok(self.list_active()?.len())
    }
}

/// Shared state for the alert endpoints.
#[derive(Clone)]
pub struct AlertApi {
    pub sessions: Arc<SessionService>,
    pub service: Arc<AlertService>,
}

/// Router builder: listing is public (clients poll it), creation is
/// role-gated behind a session.
pub fn alert_router(api: AlertApi) -> Router {
    Router::new()
        .route("/api/v1/alerts", get(list_handler).post(create_handler))
        .with_state(api)
}

async fn create_handler(
    State(api): State<AlertApi>,
    headers: HeaderMap,
    Json(new_alert): Json<NewAlert>,
) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.publish(&profile.id, profile.role, new_alert) {
        Ok(alert) => (StatusCode::CREATED, Json(json!({ "alert": alert }))).into_response(),
        Err(error @ AlertError::Forbidden) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::FORBIDDEN, Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

async fn list_handler(State(api): State<AlertApi>) -> Response {
    match api.service.list_active() {
        Ok(alerts) => (StatusCode::OK, Json(json!({ "alerts": alerts }))).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
