// Request filter
// Decision: Runs before every /api/v1 handler; skipped entirely when no strategy is configured
// Decision: No credential at all is 401, a credential that resolves to nobody is 403

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use gatehouse_core::{AuthRequest, Identity};

use crate::api::common::ApiError;
use crate::AppState;

/// Identity resolved by the request filter, available to handlers as an extension
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

/// Build the transport-neutral request view from HTTP headers.
pub fn auth_request_from_headers(path: &str, headers: &HeaderMap) -> AuthRequest {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let cookies = CookieJar::from_headers(headers)
        .iter()
        .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
        .collect();

    AuthRequest {
        path: Some(path.to_string()),
        authorization,
        cookies,
    }
}

pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(strategy) = state.strategy.clone() else {
        return next.run(req).await;
    };

    let path = req.uri().path().to_string();
    if !strategy.requires_auth(Some(&path), &state.exempt_paths) {
        return next.run(req).await;
    }

    let auth_request = auth_request_from_headers(&path, req.headers());
    if strategy.extract_credential(&auth_request).is_none() {
        tracing::debug!(path = %path, "Request without credentials");
        return ApiError::unauthorized().into_response();
    }

    match strategy.current_identity(&auth_request).await {
        Some(identity) => {
            tracing::debug!(path = %path, identity_id = %identity.id, "Request authenticated");
            req.extensions_mut().insert(CurrentIdentity(identity));
            next.run(req).await
        }
        None => {
            tracing::debug!(path = %path, "Credentials did not resolve to an identity");
            ApiError::forbidden().into_response()
        }
    }
}
