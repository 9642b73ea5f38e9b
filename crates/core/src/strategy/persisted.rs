// Expiring sessions stored in the identity store
//
// The session registry is the identity store's session table, so sessions
// survive a process restart when the store itself is persistent.

use async_trait::async_trait;
use std::sync::Arc;

use super::{
    resolve_session_identity, AuthRequest, AuthStrategy, AuthType, ExpiringSessionAuth,
    SessionManager,
};
use crate::identity::{Identity, IdentityId};
use crate::registry::StoreSessionRegistry;
use crate::session::SessionLifetime;
use crate::traits::IdentityStore;

#[derive(Clone)]
pub struct PersistedSessionAuth {
    inner: ExpiringSessionAuth,
}

impl PersistedSessionAuth {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        cookie_name: impl Into<String>,
        lifetime: SessionLifetime,
    ) -> Self {
        let durable = Arc::new(StoreSessionRegistry::new(store.clone()));
        Self {
            inner: ExpiringSessionAuth::new(durable, store, cookie_name, lifetime),
        }
    }

    pub fn inner(&self) -> &ExpiringSessionAuth {
        &self.inner
    }
}

#[async_trait]
impl SessionManager for PersistedSessionAuth {
    fn cookie_name(&self) -> &str {
        self.inner.cookie_name()
    }

    /// `None` when the record could not be written to the store.
    async fn create_session(&self, identity_id: IdentityId) -> Option<String> {
        self.inner.create_session(identity_id).await
    }

    async fn identity_for_token(&self, token: &str) -> Option<IdentityId> {
        self.inner.identity_for_token(token).await
    }

    async fn destroy_session(&self, request: &AuthRequest) -> bool {
        self.inner.destroy_session(request).await
    }

    async fn purge_expired(&self) -> usize {
        self.inner.purge_expired().await
    }
}

#[async_trait]
impl AuthStrategy for PersistedSessionAuth {
    fn kind(&self) -> AuthType {
        AuthType::PersistedSession
    }

    fn session_cookie<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        self.inner.session_cookie(request)
    }

    async fn current_identity(&self, request: &AuthRequest) -> Option<Identity> {
        resolve_session_identity(self, self.inner.inner().store().as_ref(), request).await
    }

    fn sessions(&self) -> Option<&dyn SessionManager> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::file_store::JsonFileIdentityStore;
    use crate::identity::{IdentityFilter, IdentityUpdate, PasswordDigest};
    use crate::memory::InMemoryIdentityStore;
    use crate::session::SessionRecord;
    use crate::traits::StoreResult;

    const COOKIE: &str = "_my_session_id";

    fn build(store: Arc<dyn IdentityStore>, lifetime: SessionLifetime) -> PersistedSessionAuth {
        PersistedSessionAuth::new(store, COOKIE, lifetime)
    }

    async fn add_bob(store: &dyn IdentityStore) -> Identity {
        store
            .add("bob@hbtn.io", PasswordDigest::new("$argon2id$fake"))
            .await
            .unwrap()
    }

    /// In-memory store whose session table rejects writes
    struct ReadOnlySessions(InMemoryIdentityStore);

    #[async_trait]
    impl IdentityStore for ReadOnlySessions {
        async fn find_by(&self, filter: &IdentityFilter) -> StoreResult<Option<Identity>> {
            self.0.find_by(filter).await
        }

        async fn add(&self, email: &str, digest: PasswordDigest) -> StoreResult<Identity> {
            self.0.add(email, digest).await
        }

        async fn update(&self, id: IdentityId, update: IdentityUpdate) -> StoreResult<Identity> {
            self.0.update(id, update).await
        }

        async fn insert_session(&self, _record: SessionRecord) -> StoreResult<()> {
            Err(StoreError::backend("session table is read-only"))
        }

        async fn find_session(&self, token: &str) -> StoreResult<Option<SessionRecord>> {
            self.0.find_session(token).await
        }

        async fn remove_session(&self, token: &str) -> StoreResult<bool> {
            self.0.remove_session(token).await
        }
    }

    #[tokio::test]
    async fn test_create_persists_record() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let identity = add_bob(store.as_ref()).await;
        let auth = build(store.clone(), SessionLifetime::unlimited());

        let token = auth.create_session(identity.id).await.unwrap();
        assert_eq!(store.session_count(), 1);
        assert_eq!(auth.identity_for_token(&token).await, Some(identity.id));

        let request = AuthRequest::new("/api/v1/users/me").with_cookie(COOKIE, &token);
        assert_eq!(auth.current_identity(&request).await.map(|i| i.id), Some(identity.id));
    }

    #[tokio::test]
    async fn test_failed_store_write_issues_no_token() {
        let store = Arc::new(ReadOnlySessions(InMemoryIdentityStore::new()));
        let identity = add_bob(store.as_ref()).await;
        let auth = build(store.clone(), SessionLifetime::unlimited());

        assert_eq!(auth.create_session(identity.id).await, None);
        assert_eq!(store.0.session_count(), 0);
    }

    #[tokio::test]
    async fn test_destroy_removes_persisted_record() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let identity = add_bob(store.as_ref()).await;
        let auth = build(store.clone(), SessionLifetime::from_secs(60));
        let token = auth.create_session(identity.id).await.unwrap();
        let request = AuthRequest::new("/").with_cookie(COOKIE, &token);

        assert!(auth.destroy_session(&request).await);
        assert_eq!(store.session_count(), 0);
        assert!(!auth.destroy_session(&request).await);
        assert!(auth.identity_for_token(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_session_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identities.json");

        let (identity_id, token) = {
            let store = Arc::new(JsonFileIdentityStore::open(&path).await.unwrap());
            let identity = add_bob(store.as_ref()).await;
            let auth = build(store, SessionLifetime::from_secs(3600));
            (identity.id, auth.create_session(identity.id).await.unwrap())
        };

        // Fresh process, same file
        let store = Arc::new(JsonFileIdentityStore::open(&path).await.unwrap());
        let auth = build(store, SessionLifetime::from_secs(3600));
        assert_eq!(auth.identity_for_token(&token).await, Some(identity_id));
    }

    #[tokio::test]
    async fn test_expired_persisted_session_resolves_nothing() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let identity = add_bob(store.as_ref()).await;
        let auth = build(store.clone(), SessionLifetime::new(chrono::Duration::milliseconds(50)));
        let token = auth.create_session(identity.id).await.unwrap();
        let request = AuthRequest::new("/api/v1/auth_session/logout").with_cookie(COOKIE, &token);

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;

        assert!(auth.identity_for_token(&token).await.is_none());
        assert!(!auth.destroy_session(&request).await);
        assert_eq!(store.session_count(), 1);

        assert_eq!(auth.purge_expired().await, 1);
        assert_eq!(store.session_count(), 0);
    }
}
