// User service routes
// Decision: Backed by AuthService (identity-linked session token), independent of AUTH_TYPE
// Decision: Session and reset failures answer 403 without saying which check failed

use axum::{
    extract::State,
    response::Redirect,
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use gatehouse_core::{AuthError, Identity};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::common::{non_empty, session_cookie, ApiError, CredentialsForm};
use crate::AppState;

/// Cookie carrying the identity-linked session token
pub const SESSION_COOKIE: &str = "session_id";

/// Create user service routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/users", post(register))
        .route("/sessions", post(login).delete(logout))
        .route("/profile", get(profile))
        .route("/reset_password", post(get_reset_token).put(update_password))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct UserMessage {
    pub email: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetTokenForm {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePasswordForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub reset_token: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// GET /
async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Bienvenue" }))
}

/// POST /users - Register an identity
async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Json<UserMessage>, ApiError> {
    let (email, password) = form.require()?;
    let identity = state.auth_service.register_identity(&email, &password).await?;

    Ok(Json(UserMessage {
        email: identity.email,
        message: "user created".to_string(),
    }))
}

/// POST /sessions - Log in and set the session cookie
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<(CookieJar, Json<UserMessage>), ApiError> {
    let (email, password) = form.require()?;

    if !state.auth_service.validate_login(&email, &password).await {
        return Err(ApiError::unauthorized());
    }

    let token = state
        .auth_service
        .create_session(&email)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    let jar = jar.add(session_cookie(SESSION_COOKIE, token));
    Ok((
        jar,
        Json(UserMessage {
            email,
            message: "logged in".to_string(),
        }),
    ))
}

async fn identity_from_cookie(state: &AppState, jar: &CookieJar) -> Result<Identity, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(ApiError::forbidden)?;

    state
        .auth_service
        .identity_for_session_token(&token)
        .await?
        .ok_or_else(ApiError::forbidden)
}

/// DELETE /sessions - Log out and redirect home
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let identity = identity_from_cookie(&state, &jar).await?;
    state.auth_service.destroy_session(identity.id).await?;

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Redirect::to("/")))
}

/// GET /profile
async fn profile(State(state): State<AppState>, jar: CookieJar) -> Result<Json<Value>, ApiError> {
    let identity = identity_from_cookie(&state, &jar).await?;
    Ok(Json(json!({ "email": identity.email })))
}

/// POST /reset_password - Issue a reset token
async fn get_reset_token(
    State(state): State<AppState>,
    Form(form): Form<ResetTokenForm>,
) -> Result<Json<Value>, ApiError> {
    let email = non_empty(form.email).ok_or_else(ApiError::forbidden)?;

    let token = state
        .auth_service
        .issue_reset_token(&email)
        .await
        .map_err(forbid_lookup_failure)?;

    Ok(Json(json!({ "email": email, "reset_token": token })))
}

/// PUT /reset_password - Redeem a reset token
async fn update_password(
    State(state): State<AppState>,
    Form(form): Form<UpdatePasswordForm>,
) -> Result<Json<UserMessage>, ApiError> {
    let email = non_empty(form.email).ok_or_else(ApiError::forbidden)?;
    let reset_token = non_empty(form.reset_token).ok_or_else(ApiError::forbidden)?;
    let new_password = non_empty(form.new_password).ok_or_else(ApiError::forbidden)?;

    state
        .auth_service
        .redeem_reset_token(&reset_token, &new_password)
        .await
        .map_err(forbid_lookup_failure)?;

    Ok(Json(UserMessage {
        email,
        message: "Password updated".to_string(),
    }))
}

fn forbid_lookup_failure(err: AuthError) -> ApiError {
    match err {
        AuthError::IdentityNotFound
        | AuthError::InvalidResetToken
        | AuthError::InvalidArgument(_) => ApiError::forbidden(),
        other => other.into(),
    }
}
