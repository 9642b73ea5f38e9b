// Common DTOs and error mapping for the HTTP API

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use gatehouse_core::AuthError;
use serde::{Deserialize, Serialize};

/// Error response body: `{"error": "..."}`
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            status,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidArgument(msg) => ApiError::bad_request(msg),
            AuthError::DuplicateIdentity(_) => ApiError::bad_request("email already registered"),
            AuthError::IdentityNotFound => ApiError::not_found("no user found for this email"),
            AuthError::WrongPassword
            | AuthError::MalformedCredentialHeader
            | AuthError::MalformedBase64 => ApiError::unauthorized(),
            AuthError::SessionNotFound | AuthError::InvalidResetToken => ApiError::forbidden(),
            AuthError::Hashing(_) | AuthError::Store(_) => {
                tracing::error!(error = %err, "Authentication backend failure");
                ApiError::internal()
            }
        }
    }
}

/// Email/password form fields; missing fields are reported by the handler.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialsForm {
    /// Both fields, or a 400 naming the first missing one.
    pub fn require(self) -> Result<(String, String), ApiError> {
        let email = non_empty(self.email).ok_or_else(|| ApiError::bad_request("email missing"))?;
        let password =
            non_empty(self.password).ok_or_else(|| ApiError::bad_request("password missing"))?;
        Ok((email, password))
    }
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Session cookie carrying `token` under `name`
pub fn session_cookie(name: &str, token: String) -> Cookie<'static> {
    Cookie::build((name.to_string(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::StoreError;

    #[test]
    fn test_auth_error_status_mapping() {
        let cases = [
            (AuthError::invalid_argument("email is required"), StatusCode::BAD_REQUEST),
            (AuthError::DuplicateIdentity("a@b.c".into()), StatusCode::BAD_REQUEST),
            (AuthError::IdentityNotFound, StatusCode::NOT_FOUND),
            (AuthError::WrongPassword, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidResetToken, StatusCode::FORBIDDEN),
            (AuthError::Store(StoreError::NotFound), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_credentials_form_requires_both_fields() {
        let form = CredentialsForm {
            email: Some("bob@hbtn.io".into()),
            password: None,
        };
        assert_eq!(form.require().unwrap_err().error, "password missing");

        let form = CredentialsForm {
            email: Some(String::new()),
            password: Some("pwd".into()),
        };
        assert_eq!(form.require().unwrap_err().error, "email missing");
    }
}
