// Request authentication strategies
// Decision: One small trait (AuthStrategy) with independent implementations
// Decision: "Extension" is wrapping: ExpiringSessionAuth holds a SessionAuth, PersistedSessionAuth holds an ExpiringSessionAuth
// Decision: Failures resolve to None; the route layer maps absence to 401/403
//
// Variants:
// - NullAuth: authentication configured off for identities, path rules still apply
// - BasicAuth: Authorization: Basic <base64(email:password)>
// - SessionAuth: session cookie resolved through a SessionRegistry
// - ExpiringSessionAuth: SessionAuth plus a session lifetime
// - PersistedSessionAuth: ExpiringSessionAuth whose registry is the IdentityStore session table

mod basic;
mod expiring;
mod null;
mod persisted;
mod session;

pub use basic::BasicAuth;
pub use expiring::ExpiringSessionAuth;
pub use null::NullAuth;
pub use persisted::PersistedSessionAuth;
pub use session::SessionAuth;

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AuthConfig;
use crate::identity::{Identity, IdentityFilter, IdentityId};
use crate::password::PasswordHasher;
use crate::path_matcher::{self, PathRule};
use crate::registry::InMemorySessionRegistry;
use crate::traits::IdentityStore;

// ============================================================================
// Request view
// ============================================================================

/// Transport-neutral view of the parts of a request authentication reads.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    pub path: Option<String>,
    /// Raw `Authorization` header value
    pub authorization: Option<String>,
    pub cookies: HashMap<String, String>,
}

impl AuthRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Credential material found on a request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Raw `Authorization` header value
    Header(String),
    /// Session token read from the configured cookie
    SessionToken(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Header(_) => f.write_str("Header(<redacted>)"),
            Credential::SessionToken(_) => f.write_str("SessionToken(<redacted>)"),
        }
    }
}

// ============================================================================
// Strategy selection
// ============================================================================

/// Configured authentication flavour (`AUTH_TYPE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    Null,
    Basic,
    Session,
    ExpiringSession,
    PersistedSession,
}

impl AuthType {
    /// Parse an `AUTH_TYPE` value. Unknown values select nothing.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "auth" => Some(AuthType::Null),
            "basic_auth" => Some(AuthType::Basic),
            "session_auth" => Some(AuthType::Session),
            "session_exp_auth" => Some(AuthType::ExpiringSession),
            "session_db_auth" => Some(AuthType::PersistedSession),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::Null => "auth",
            AuthType::Basic => "basic_auth",
            AuthType::Session => "session_auth",
            AuthType::ExpiringSession => "session_exp_auth",
            AuthType::PersistedSession => "session_db_auth",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Per-request authentication contract
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    fn kind(&self) -> AuthType;

    /// Whether `path` needs an authenticated identity.
    fn requires_auth(&self, path: Option<&str>, exempt: &[PathRule]) -> bool {
        path_matcher::requires_auth(path, exempt)
    }

    fn authorization_header<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        request.authorization.as_deref().filter(|h| !h.is_empty())
    }

    /// Session token carried by the request; only session strategies read one.
    fn session_cookie<'a>(&self, _request: &'a AuthRequest) -> Option<&'a str> {
        None
    }

    /// Credential material present on the request, header first.
    fn extract_credential(&self, request: &AuthRequest) -> Option<Credential> {
        if let Some(header) = self.authorization_header(request) {
            return Some(Credential::Header(header.to_string()));
        }
        self.session_cookie(request)
            .map(|token| Credential::SessionToken(token.to_string()))
    }

    /// Resolve the request to an identity, or `None` on any failure.
    async fn current_identity(&self, request: &AuthRequest) -> Option<Identity>;

    /// Session capabilities, when the strategy is session based.
    fn sessions(&self) -> Option<&dyn SessionManager> {
        None
    }
}

/// Session lifecycle capabilities shared by the session strategies
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Name of the cookie carrying the session token
    fn cookie_name(&self) -> &str;

    /// Start a session for `identity_id`; `None` for a nil id.
    async fn create_session(&self, identity_id: IdentityId) -> Option<String>;

    /// Identity owning a live session, `None` when unknown, expired or empty.
    async fn identity_for_token(&self, token: &str) -> Option<IdentityId>;

    /// Destroy the session named by the request cookie.
    /// Returns false (no-op) when there is nothing to destroy.
    async fn destroy_session(&self, request: &AuthRequest) -> bool;

    /// Drop expired records from the backing registries. Expired tokens
    /// already resolve to nothing, so this only reclaims memory.
    async fn purge_expired(&self) -> usize;
}

/// Read a non-empty cookie value
pub(crate) fn read_cookie<'a>(request: &'a AuthRequest, name: &str) -> Option<&'a str> {
    request.cookie(name).filter(|v| !v.is_empty())
}

/// Cookie -> token -> identity id -> identity
pub(crate) async fn resolve_session_identity(
    manager: &dyn SessionManager,
    store: &dyn IdentityStore,
    request: &AuthRequest,
) -> Option<Identity> {
    let token = read_cookie(request, manager.cookie_name())?;
    let identity_id = manager.identity_for_token(token).await?;
    load_identity(store, identity_id).await
}

pub(crate) async fn load_identity(store: &dyn IdentityStore, id: IdentityId) -> Option<Identity> {
    match store.find_by(&IdentityFilter::by_id(id)).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(identity_id = %id, error = %e, "Failed to load identity for session");
            None
        }
    }
}

/// Periodically purge expired sessions of a session-based strategy.
///
/// Returns `None` when the strategy keeps no sessions.
pub fn spawn_expiry_sweep(
    strategy: Arc<dyn AuthStrategy>,
    interval: Duration,
) -> Option<tokio::task::JoinHandle<()>> {
    strategy.sessions()?;
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(sessions) = strategy.sessions() else {
                return;
            };
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "Purged expired sessions");
            }
        }
    }))
}

/// Build the strategy selected by the configuration.
///
/// Returns `None` when no `AUTH_TYPE` is configured (request filter disabled).
pub fn build_strategy(
    config: &AuthConfig,
    store: Arc<dyn IdentityStore>,
    hasher: Arc<dyn PasswordHasher>,
) -> Option<Arc<dyn AuthStrategy>> {
    let auth_type = config.auth_type?;
    let cookie_name = config.session_name.clone();

    let strategy: Arc<dyn AuthStrategy> = match auth_type {
        AuthType::Null => Arc::new(NullAuth::new()),
        AuthType::Basic => Arc::new(BasicAuth::new(store, hasher)),
        AuthType::Session => Arc::new(SessionAuth::new(
            Arc::new(InMemorySessionRegistry::new()),
            store,
            cookie_name,
        )),
        AuthType::ExpiringSession => Arc::new(ExpiringSessionAuth::new(
            Arc::new(InMemorySessionRegistry::new()),
            store,
            cookie_name,
            config.session_lifetime,
        )),
        AuthType::PersistedSession => Arc::new(PersistedSessionAuth::new(
            store,
            cookie_name,
            config.session_lifetime,
        )),
    };

    tracing::info!(auth_type = %auth_type, "Authentication strategy configured");
    Some(strategy)
}
