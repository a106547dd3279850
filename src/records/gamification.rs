use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{require_user, SessionService, UserId};
use crate::store::{self, KeyValueStore};

use super::compliance::record_error_response;
use super::RecordError;

const POINTS_PER_LEVEL: u32 = 100;

/// Per-user engagement counters. Level is derived from points; badges are
/// deduplicated on award.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamificationState {
    pub points: u32,
    pub level: u32,
    pub badges: Vec<String>,
    pub streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

impl Default for GamificationState {
    fn default() -> Self {
        Self {
            points: 0,
            level: 1,
            badges: Vec::new(),
            streak: 0,
            last_activity: None,
        }
    }
}

impl GamificationState {
    fn apply_award(&mut self, points: u32, badge: Option<&str>, now: DateTime<Utc>) {
        // Points are client-supplied; saturate instead of overflowing.
        self.points = self.points.saturating_add(points);
        self.level = self.points / POINTS_PER_LEVEL + 1;

        if let Some(badge) = badge {
            if !self.badges.iter().any(|held| held == badge) {
                self.badges.push(badge.to_string());
            }
        }

        self.streak = match self.last_activity {
            Some(last) if last.date_naive() == now.date_naive() => self.streak.max(1),
            Some(last) if last.date_naive() + Duration::days(1) == now.date_naive() => {
                self.streak + 1
            }
            _ => 1,
        };
        self.last_activity = Some(now);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Award {
    pub points: u32,
    #[serde(default)]
    pub badge: Option<String>,
}

fn state_key(owner: &UserId) -> String {
    format!("user:{}:gamification", owner.0)
}

pub struct GamificationService {
    store: Arc<dyn KeyValueStore>,
}

impl GamificationService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn state(&self, owner: &UserId) -> Result<GamificationState, RecordError> {
        let state = store::get_record(self.store.as_ref(), &state_key(owner))?
            .unwrap_or_default();
        Ok(state)
    }

    pub fn award(&self, owner: &UserId, award: Award) -> Result<GamificationState, RecordError> {
        let mut state = self.state(owner)?;
        state.apply_award(award.points, award.badge.as_deref(), Utc::now());
        store::put_record(self.store.as_ref(), &state_key(owner), &state)?;
        Ok(state)
    }
}

/// Shared state for the gamification endpoints.
#[derive(Clone)]
pub struct GamificationApi {
    pub sessions: Arc<SessionService>,
    pub service: Arc<GamificationService>,
}

pub fn gamification_router(api: GamificationApi) -> Router {
    Router::new()
        .route("/api/v1/gamification", get(state_handler))
        .route("/api/v1/gamification/award", axum::routing::post(award_handler))
        .with_state(api)
}

async fn state_handler(State(api): State<GamificationApi>, headers: HeaderMap) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.state(&profile.id) {
        Ok(state) => (StatusCode::OK, Json(json!({ "gamification": state }))).into_response(),
        Err(error) => record_error_response(error),
    }
}

async fn award_handler(
    State(api): State<GamificationApi>,
    headers: HeaderMap,
    Json(award): Json<Award>,
) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.award(&profile.id, award) {
        Ok(state) => (StatusCode::OK, Json(json!({ "gamification": state }))).into_response(),
        Err(error) => record_error_response(error),
    }
}
