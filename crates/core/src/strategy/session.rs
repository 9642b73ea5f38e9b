// Cookie-based session authentication over an injected SessionRegistry

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::{
    read_cookie, resolve_session_identity, AuthRequest, AuthStrategy, AuthType, SessionManager,
};
use crate::identity::{Identity, IdentityId};
use crate::registry::SessionRegistry;
use crate::session::{SessionLifetime, SessionRecord};
use crate::traits::IdentityStore;

#[derive(Clone)]
pub struct SessionAuth {
    registry: Arc<dyn SessionRegistry>,
    store: Arc<dyn IdentityStore>,
    cookie_name: String,
    // Stamped on new records so sweeps can reclaim them; lookups here ignore it
    lifetime: SessionLifetime,
}

impl SessionAuth {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        store: Arc<dyn IdentityStore>,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            store,
            cookie_name: cookie_name.into(),
            lifetime: SessionLifetime::unlimited(),
        }
    }

    pub(crate) fn with_lifetime(mut self, lifetime: SessionLifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn registry(&self) -> &Arc<dyn SessionRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn IdentityStore> {
        &self.store
    }

    /// Raw record for a token, expired or not.
    pub async fn session_record(&self, token: &str) -> Option<SessionRecord> {
        if token.is_empty() {
            return None;
        }
        self.registry.get(token).await
    }
}

#[async_trait]
impl SessionManager for SessionAuth {
    fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    async fn create_session(&self, identity_id: IdentityId) -> Option<String> {
        if identity_id.is_nil() {
            return None;
        }
        let record = SessionRecord::new(identity_id, self.lifetime);
        let token = record.token.clone();
        if self.registry.insert(record).await.is_err() {
            tracing::warn!(identity_id = %identity_id, "Session not created: registry write failed");
            return None;
        }
        tracing::debug!(identity_id = %identity_id, "Session created");
        Some(token)
    }

    async fn identity_for_token(&self, token: &str) -> Option<IdentityId> {
        self.session_record(token).await.map(|r| r.identity_id)
    }

    async fn destroy_session(&self, request: &AuthRequest) -> bool {
        let Some(token) = read_cookie(request, &self.cookie_name) else {
            return false;
        };
        match self.registry.remove(token).await {
            Some(record) => {
                tracing::debug!(identity_id = %record.identity_id, "Session destroyed");
                true
            }
            None => false,
        }
    }

    async fn purge_expired(&self) -> usize {
        self.registry.purge_expired(Utc::now()).await
    }
}

#[async_trait]
impl AuthStrategy for SessionAuth {
    fn kind(&self) -> AuthType {
        AuthType::Session
    }

    fn session_cookie<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        read_cookie(request, &self.cookie_name)
    }

    async fn current_identity(&self, request: &AuthRequest) -> Option<Identity> {
        resolve_session_identity(self, self.store.as_ref(), request).await
    }

    fn sessions(&self) -> Option<&dyn SessionManager> {
        Some(self)
    }
}
