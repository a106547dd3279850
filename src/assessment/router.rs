use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{require_user, FarmType, SessionService};

use super::domain::AnswerSet;
use super::repository::{AssessmentRepository, RepositoryError};
use super::service::{AssessmentError, AssessmentService};

/// Shared state for the assessment endpoints.
pub struct AssessmentApi<R> {
    pub sessions: Arc<SessionService>,
    pub service: Arc<AssessmentService<R>>,
}

impl<R> Clone for AssessmentApi<R> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            service: self.service.clone(),
        }
    }
}

/// Router builder exposing submission and listing for the calling user.
pub fn assessment_router<R>(api: AssessmentApi<R>) -> Router
where
    R: AssessmentRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/assessments",
            get(list_handler::<R>).post(submit_handler::<R>),
        )
        .with_state(api)
}

#[derive(Debug, Deserialize)]
struct SubmitAssessmentRequest {
    farm_type: FarmType,
    answers: AnswerSet,
}

async fn submit_handler<R>(
    State(api): State<AssessmentApi<R>>,
    headers: HeaderMap,
    Json(request): Json<SubmitAssessmentRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api
        .service
        .submit(&profile.id, request.farm_type, request.answers)
    {
        Ok(assessment) => {
            (StatusCode::CREATED, Json(json!({ "assessment": assessment }))).into_response()
        }
        Err(AssessmentError::Scoring(error)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(AssessmentError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({ "error": "assessment already exists" });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

async fn list_handler<R>(State(api): State<AssessmentApi<R>>, headers: HeaderMap) -> Response
where
    R: AssessmentRepository + 'static,
{
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.list(&profile.id) {
        Ok(assessments) => {
            (StatusCode::OK, Json(json!({ "assessments": assessments }))).into_response()
        }
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
