use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{NewUser, ProfileUpdate, UserProfile};
use super::service::{AuthError, SessionService};

/// Router builder exposing registration, login, and profile endpoints.
pub fn auth_router(sessions: Arc<SessionService>) -> Router {
    Router::new()
        .route("/api/v1/auth/signup", post(signup_handler))
        .route("/api/v1/auth/login", post(login_handler))
        .route("/api/v1/auth/logout", post(logout_handler))
        .route(
            "/api/v1/auth/profile",
            get(profile_handler).put(update_profile_handler),
        )
        .with_state(sessions)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Resolve the calling user or produce the 401 response the caller should
/// return. Shared by every owned-record router.
pub fn require_user(
    sessions: &SessionService,
    headers: &HeaderMap,
) -> Result<UserProfile, Response> {
    let token = bearer_token(headers).ok_or_else(unauthorized_response)?;
    match sessions.current_user(token) {
        Ok(Some(profile)) => Ok(profile),
        Ok(None) => Err(unauthorized_response()),
        Err(error) => Err(auth_error_response(error)),
    }
}

fn unauthorized_response() -> Response {
    let payload = json!({ "error": AuthError::Unauthorized.to_string() });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

fn auth_error_response(error: AuthError) -> Response {
    let status = match error {
        AuthError::DuplicateEmail => StatusCode::CONFLICT,
        AuthError::InvalidCredentials | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
        AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn signup_handler(
    State(sessions): State<Arc<SessionService>>,
    Json(new_user): Json<NewUser>,
) -> Response {
    match sessions.register(new_user) {
        Ok((profile, token)) => {
            let payload = json!({ "profile": profile, "token": token });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(error) => auth_error_response(error),
    }
}

async fn login_handler(
    State(sessions): State<Arc<SessionService>>,
    Json(request): Json<LoginRequest>,
) -> Response {
    match sessions.login(&request.email, &request.password) {
        Ok((profile, token)) => {
            let payload = json!({ "profile": profile, "token": token });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => auth_error_response(error),
    }
}

async fn logout_handler(
    State(sessions): State<Arc<SessionService>>,
    headers: HeaderMap,
) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unauthorized_response();
    };
    match sessions.logout(token) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(error) => auth_error_response(error),
    }
}

async fn profile_handler(
    State(sessions): State<Arc<SessionService>>,
    headers: HeaderMap,
) -> Response {
    match require_user(&sessions, &headers) {
        Ok(profile) => (StatusCode::OK, Json(json!({ "profile": profile }))).into_response(),
        Err(response) => response,
    }
}

async fn update_profile_handler(
    State(sessions): State<Arc<SessionService>>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    let profile = match require_user(&sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };
    match sessions.update_profile(&profile.id, update) {
        Ok(updated) => (StatusCode::OK, Json(json!({ "profile": updated }))).into_response(),
        Err(error) => auth_error_response(error),
    }
}
