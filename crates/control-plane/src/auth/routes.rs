// Authenticated API routes (/api/v1)
// Decision: Session login/logout go through the configured strategy's SessionManager
// Decision: Wrong password on session login is 401, unknown email is 404

use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use gatehouse_core::{IdentityView, SessionManager};
use serde_json::{json, Value};

use super::middleware::{auth_request_from_headers, CurrentIdentity};
use crate::api::common::{session_cookie, ApiError, CredentialsForm};
use crate::AppState;

pub const STATUS_PATH: &str = "/api/v1/status";
pub const UNAUTHORIZED_PATH: &str = "/api/v1/unauthorized";
pub const FORBIDDEN_PATH: &str = "/api/v1/forbidden";
pub const ME_PATH: &str = "/api/v1/users/me";
pub const LOGIN_PATH: &str = "/api/v1/auth_session/login";
pub const LOGOUT_PATH: &str = "/api/v1/auth_session/logout";

/// Create the /api/v1 routes. The request filter is layered on by the caller.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(STATUS_PATH, get(status))
        .route(UNAUTHORIZED_PATH, get(unauthorized))
        .route(FORBIDDEN_PATH, get(forbidden))
        .route(ME_PATH, get(me))
        .route(LOGIN_PATH, post(login))
        .route(LOGOUT_PATH, delete(logout))
        .with_state(state)
}

/// GET /api/v1/status
async fn status() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// GET /api/v1/unauthorized
async fn unauthorized() -> ApiError {
    ApiError::unauthorized()
}

/// GET /api/v1/forbidden
async fn forbidden() -> ApiError {
    ApiError::forbidden()
}

/// GET /api/v1/users/me - Identity resolved by the request filter
async fn me(identity: Option<Extension<CurrentIdentity>>) -> Result<Json<IdentityView>, ApiError> {
    let Extension(CurrentIdentity(identity)) =
        identity.ok_or_else(|| ApiError::not_found("Not found"))?;
    Ok(Json(IdentityView::from(&identity)))
}

fn session_manager(state: &AppState) -> Result<&dyn SessionManager, ApiError> {
    state
        .strategy
        .as_deref()
        .and_then(|strategy| strategy.sessions())
        .ok_or_else(|| ApiError::not_found("session authentication is not enabled"))
}

/// POST /api/v1/auth_session/login - Start a session with email and password
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<(CookieJar, Json<IdentityView>), ApiError> {
    let (email, password) = form.require()?;

    let identity = state
        .auth_service
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("no user found for this email"))?;

    if !state
        .auth_service
        .hasher()
        .verify(&password, &identity.password_digest)
    {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "wrong password"));
    }

    let sessions = session_manager(&state)?;
    let token = sessions.create_session(identity.id).await.ok_or_else(|| {
        tracing::error!(identity_id = %identity.id, "Session creation failed");
        ApiError::internal()
    })?;

    tracing::info!(identity_id = %identity.id, "Session login");
    let jar = jar.add(session_cookie(sessions.cookie_name(), token));
    Ok((jar, Json(IdentityView::from(&identity))))
}

/// DELETE /api/v1/auth_session/logout - Destroy the current session
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let sessions = session_manager(&state)?;
    let request = auth_request_from_headers(LOGOUT_PATH, &headers);

    if !sessions.destroy_session(&request).await {
        return Err(ApiError::not_found("Not found"));
    }

    let jar = jar.remove(Cookie::build(sessions.cookie_name().to_string()).path("/"));
    Ok((jar, Json(json!({}))))
}
