// Session authentication with a configured lifetime
//
// Expiry is lazy: a session older than the lifetime resolves to nothing but
// its record is left in the registry until swept.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::{
    read_cookie, resolve_session_identity, AuthRequest, AuthStrategy, AuthType, SessionAuth,
    SessionManager,
};
use crate::identity::{Identity, IdentityId};
use crate::registry::SessionRegistry;
use crate::session::{SessionLifetime, SessionRecord};
use crate::traits::IdentityStore;

#[derive(Clone)]
pub struct ExpiringSessionAuth {
    inner: SessionAuth,
    lifetime: SessionLifetime,
}

impl ExpiringSessionAuth {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        store: Arc<dyn IdentityStore>,
        cookie_name: impl Into<String>,
        lifetime: SessionLifetime,
    ) -> Self {
        Self::wrap(SessionAuth::new(registry, store, cookie_name), lifetime)
    }

    /// Add expiry to an existing session strategy.
    pub fn wrap(inner: SessionAuth, lifetime: SessionLifetime) -> Self {
        Self {
            inner: inner.with_lifetime(lifetime),
            lifetime,
        }
    }

    pub fn inner(&self) -> &SessionAuth {
        &self.inner
    }

    pub fn lifetime(&self) -> SessionLifetime {
        self.lifetime
    }

    /// `created_at + lifetime` has passed at `now`.
    pub fn is_expired(&self, record: &SessionRecord, now: DateTime<Utc>) -> bool {
        self.lifetime
            .deadline(record.created_at)
            .is_some_and(|deadline| deadline < now)
    }
}

#[async_trait]
impl SessionManager for ExpiringSessionAuth {
    fn cookie_name(&self) -> &str {
        self.inner.cookie_name()
    }

    async fn create_session(&self, identity_id: IdentityId) -> Option<String> {
        self.inner.create_session(identity_id).await
    }

    async fn identity_for_token(&self, token: &str) -> Option<IdentityId> {
        if self.lifetime.is_unlimited() {
            return self.inner.identity_for_token(token).await;
        }

        let record = self.inner.session_record(token).await?;
        if self.is_expired(&record, Utc::now()) {
            tracing::debug!(identity_id = %record.identity_id, "Session expired");
            return None;
        }
        Some(record.identity_id)
    }

    /// Only a live session can be destroyed; an expired token is left for the sweep.
    async fn destroy_session(&self, request: &AuthRequest) -> bool {
        let Some(token) = read_cookie(request, self.cookie_name()) else {
            return false;
        };
        if self.identity_for_token(token).await.is_none() {
            return false;
        }
        self.inner.destroy_session(request).await
    }

    async fn purge_expired(&self) -> usize {
        self.inner.purge_expired().await
    }
}

#[async_trait]
impl AuthStrategy for ExpiringSessionAuth {
    fn kind(&self) -> AuthType {
        AuthType::ExpiringSession
    }

    fn session_cookie<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        self.inner.session_cookie(request)
    }

    async fn current_identity(&self, request: &AuthRequest) -> Option<Identity> {
        resolve_session_identity(self, self.inner.store().as_ref(), request).await
    }

    fn sessions(&self) -> Option<&dyn SessionManager> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PasswordDigest;
    use crate::memory::InMemoryIdentityStore;
    use crate::registry::InMemorySessionRegistry;
    use std::time::Duration;

    const COOKIE: &str = "_my_session_id";

    async fn setup(lifetime: SessionLifetime) -> (ExpiringSessionAuth, Arc<InMemorySessionRegistry>, Identity) {
        let store = Arc::new(InMemoryIdentityStore::new());
        let identity = store
            .add("bob@hbtn.io", PasswordDigest::new("$argon2id$fake"))
            .await
            .unwrap();
        let registry = Arc::new(InMemorySessionRegistry::new());
        let auth = ExpiringSessionAuth::new(registry.clone(), store, COOKIE, lifetime);
        (auth, registry, identity)
    }

    #[tokio::test]
    async fn test_resolves_before_deadline() {
        let (auth, _, identity) = setup(SessionLifetime::from_secs(1)).await;
        let token = auth.create_session(identity.id).await.unwrap();
        assert_eq!(auth.identity_for_token(&token).await, Some(identity.id));
    }

    #[tokio::test]
    async fn test_expired_session_resolves_nothing_but_is_kept() {
        let (auth, registry, identity) = setup(SessionLifetime::from_secs(1)).await;
        let token = auth.create_session(identity.id).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(auth.identity_for_token(&token).await, None);
        let request = AuthRequest::new("/api/v1/users/me").with_cookie(COOKIE, &token);
        assert!(auth.current_identity(&request).await.is_none());
        // Lazy expiry: the record is still there
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_lifetime_behaves_as_plain_sessions() {
        for lifetime in [SessionLifetime::from_secs(0), SessionLifetime::from_secs(-1)] {
            let (auth, _, identity) = setup(lifetime).await;
            let token = auth.create_session(identity.id).await.unwrap();
            assert_eq!(auth.identity_for_token(&token).await, Some(identity.id));
            let record = auth.inner().session_record(&token).await.unwrap();
            assert_eq!(record.expires_at, None);
        }
    }

    #[tokio::test]
    async fn test_is_expired_uses_created_at_plus_lifetime() {
        let (auth, _, identity) = setup(SessionLifetime::from_secs(10)).await;
        let token = auth.create_session(identity.id).await.unwrap();
        let record = auth.inner().session_record(&token).await.unwrap();

        assert!(!auth.is_expired(&record, record.created_at + chrono::Duration::seconds(10)));
        assert!(auth.is_expired(&record, record.created_at + chrono::Duration::seconds(11)));
    }

    #[tokio::test]
    async fn test_destroy_delegates() {
        let (auth, registry, identity) = setup(SessionLifetime::from_secs(60)).await;
        let token = auth.create_session(identity.id).await.unwrap();
        let request = AuthRequest::new("/").with_cookie(COOKIE, &token);

        assert!(auth.destroy_session(&request).await);
        assert!(!auth.destroy_session(&request).await);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_destroy_of_expired_session_reports_nothing_destroyed() {
        let (auth, registry, identity) = setup(SessionLifetime::from_secs(1)).await;
        let token = auth.create_session(identity.id).await.unwrap();
        let request = AuthRequest::new("/api/v1/auth_session/logout").with_cookie(COOKIE, &token);

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(auth.identity_for_token(&token).await, None);
        assert!(!auth.destroy_session(&request).await);
        assert_eq!(registry.len(), 1);
        assert_eq!(auth.purge_expired().await, 1);
    }
}
