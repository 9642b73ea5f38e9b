// Error types for authentication and identity lifecycle
//
// Per-request authentication failures are not errors: strategies return
// `Option<Identity>` and the route layer maps absence to 401/403.
// The variants here are for identity-lifecycle operations and store access.

use thiserror::Error;

/// Result type alias for identity-lifecycle operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors surfaced by `AuthService` and password hashing
#[derive(Debug, Error)]
pub enum AuthError {
    /// Empty or malformed email, password or token input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Email already registered
    #[error("Identity {0} already exists")]
    DuplicateIdentity(String),

    /// No identity matches the lookup
    #[error("Identity not found")]
    IdentityNotFound,

    /// Cleartext does not match the stored digest
    #[error("Wrong password")]
    WrongPassword,

    /// Authorization header does not carry a Basic credential
    #[error("Malformed credential header")]
    MalformedCredentialHeader,

    /// Basic credential payload is not valid base64 / UTF-8
    #[error("Malformed base64 credential")]
    MalformedBase64,

    /// Session token unknown, destroyed or expired
    #[error("Session not found")]
    SessionNotFound,

    /// Reset token empty or not outstanding for any identity
    #[error("Invalid reset token")]
    InvalidResetToken,

    /// Password hashing primitive failed
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Identity store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        AuthError::InvalidArgument(msg.into())
    }

    /// Create a hashing error
    pub fn hashing(msg: impl Into<String>) -> Self {
        AuthError::Hashing(msg.into())
    }
}

/// Errors raised by `IdentityStore` implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    /// Lookup or update referenced no usable field
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Uniqueness constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend unavailable or inconsistent
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn invalid_field(msg: impl Into<String>) -> Self {
        StoreError::InvalidField(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }
}
