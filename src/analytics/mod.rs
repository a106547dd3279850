//! Authority dashboard aggregation.
//!
//! The reducer is a pure fold over stored assessments and profiles. It
//! counts the risk tier each assessment was stored with rather than
//! rescoring, so the dashboard can never drift from what submission
//! computed.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::alerts::AlertService;
use crate::assessment::{Assessment, AssessmentRepository, AssessmentService, RiskTier};
use crate::auth::{require_user, FarmType, Role, SessionService, UserProfile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FarmTypeDistribution {
    pub pig: usize,
    pub poultry: usize,
    pub both: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub total_users: usize,
    pub total_assessments: usize,
    pub risk_distribution: RiskDistribution,
    pub farm_type_distribution: FarmTypeDistribution,
    pub average_compliance: f64,
}

/// Fold assessments and profiles into one dashboard snapshot. Running it
/// twice over the same inputs gives the same snapshot.
pub fn aggregate(assessments: &[Assessment], profiles: &[UserProfile]) -> AnalyticsSnapshot {
    let mut risk = RiskDistribution::default();
    let mut compliance_total: u64 = 0;
    for assessment in assessments {
        match assessment.risk_tier {
            RiskTier::Low => risk.low += 1,
            RiskTier::Medium => risk.medium += 1,
            RiskTier::High => risk.high += 1,
        }
        compliance_total += u64::from(assessment.compliance_score);
    }

    let mut farms = FarmTypeDistribution::default();
    for profile in profiles {
        match profile.farm_type {
            Some(FarmType::Pig) => farms.pig += 1,
            Some(FarmType::Poultry) => farms.poultry += 1,
            Some(FarmType::Both) => farms.both += 1,
            None => {}
        }
    }

    AnalyticsSnapshot {
        total_users: profiles.len(),
        total_assessments: assessments.len(),
        risk_distribution: risk,
        farm_type_distribution: farms,
        average_compliance: mean(compliance_total, assessments.len()),
    }
}

fn mean(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Shared state for the analytics endpoint.
pub struct AnalyticsApi<R> {
    pub sessions: Arc<SessionService>,
    pub assessments: Arc<AssessmentService<R>>,
    pub alerts: Arc<AlertService>,
}

impl<R> Clone for AnalyticsApi<R> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            assessments: self.assessments.clone(),
            alerts: self.alerts.clone(),
        }
    }
}

pub fn analytics_router<R>(api: AnalyticsApi<R>) -> Router
where
    R: AssessmentRepository + 'static,
{
    Router::new()
        .route("/api/v1/analytics", get(snapshot_handler::<R>))
        .with_state(api)
}

async fn snapshot_handler<R>(State(api): State<AnalyticsApi<R>>, headers: HeaderMap) -> Response
where
    R: AssessmentRepository + 'static,
{
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };
    if profile.role != Role::Authority {
        let payload = json!({ "error": "analytics is restricted to authority accounts" });
        return (StatusCode::FORBIDDEN, Json(payload)).into_response();
    }

    let assessments = match api.assessments.list_all() {
        Ok(assessments) => assessments,
        Err(error) => return internal_error(error),
    };
    let profiles = match api.sessions.all_profiles() {
        Ok(profiles) => profiles,
        Err(error) => return internal_error(error),
    };
    let active_alerts = match api.alerts.active_count() {
        Ok(count) => count,
        Err(error) => return internal_error(error),
    };

    let snapshot = aggregate(&assessments, &profiles);
    (
        StatusCode::OK,
        Json(json!({
            "analytics": snapshot,
            "active_alerts": active_alerts,
            "generated_at": Utc::now(),
        })),
    )
        .into_response()
}

fn internal_error(error: impl std::fmt::Display) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
