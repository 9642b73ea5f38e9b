// In-memory identity storage for dev mode and testing
// Decision: Use parking_lot for thread-safe access
// Decision: Each mutation runs under a single write lock, so multi-field updates are atomic
//
// All data is stored in memory and lost on restart. `JsonFileIdentityStore`
// wraps the same state and snapshots it to disk.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::StoreError;
use crate::identity::{Identity, IdentityFilter, IdentityId, IdentityUpdate, PasswordDigest};
use crate::session::SessionRecord;
use crate::traits::{IdentityStore, StoreResult};

/// Identity table plus durable session table.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct StoreState {
    #[serde(default)]
    identities: HashMap<IdentityId, Identity>,
    #[serde(default)]
    sessions: HashMap<String, SessionRecord>,
}

impl StoreState {
    pub(crate) fn find_by(&self, filter: &IdentityFilter) -> StoreResult<Option<Identity>> {
        if filter.is_empty() {
            return Err(StoreError::invalid_field("lookup requires at least one field"));
        }
        if let Some(id) = filter.id {
            return Ok(self.identities.get(&id).filter(|i| i.matches(filter)).cloned());
        }
        Ok(self
            .identities
            .values()
            .find(|i| i.matches(filter))
            .cloned())
    }

    pub(crate) fn add(&mut self, email: &str, password_digest: PasswordDigest) -> StoreResult<Identity> {
        if email.is_empty() {
            return Err(StoreError::invalid_field("email must not be empty"));
        }
        if self.identities.values().any(|i| i.email == email) {
            return Err(StoreError::Conflict(format!("email {} already registered", email)));
        }
        let identity = Identity::new(email, password_digest);
        self.identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    pub(crate) fn update(&mut self, id: IdentityId, update: IdentityUpdate) -> StoreResult<Identity> {
        if update.is_empty() {
            return Err(StoreError::invalid_field("update requires at least one field"));
        }
        let identity = self.identities.get_mut(&id).ok_or(StoreError::NotFound)?;
        identity.apply(update);
        Ok(identity.clone())
    }

    pub(crate) fn insert_session(&mut self, record: SessionRecord) -> StoreResult<()> {
        if self.sessions.contains_key(&record.token) {
            return Err(StoreError::Conflict("session token already in use".to_string()));
        }
        self.sessions.insert(record.token.clone(), record);
        Ok(())
    }

    pub(crate) fn find_session(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.get(token).cloned()
    }

    pub(crate) fn remove_session(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub(crate) fn purge_expired_sessions(&mut self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, record| !record.is_expired_at(now));
        before - self.sessions.len()
    }
}

/// In-memory identity store
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    state: RwLock<StoreState>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered identities
    pub fn identity_count(&self) -> usize {
        self.state.read().identities.len()
    }

    /// Number of persisted session records, expired ones included
    pub fn session_count(&self) -> usize {
        self.state.read().sessions.len()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by(&self, filter: &IdentityFilter) -> StoreResult<Option<Identity>> {
        self.state.read().find_by(filter)
    }

    async fn add(&self, email: &str, password_digest: PasswordDigest) -> StoreResult<Identity> {
        self.state.write().add(email, password_digest)
    }

    async fn update(&self, id: IdentityId, update: IdentityUpdate) -> StoreResult<Identity> {
        self.state.write().update(id, update)
    }

    async fn insert_session(&self, record: SessionRecord) -> StoreResult<()> {
        self.state.write().insert_session(record)
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<SessionRecord>> {
        Ok(self.state.read().find_session(token))
    }

    async fn remove_session(&self, token: &str) -> StoreResult<bool> {
        Ok(self.state.write().remove_session(token))
    }

    async fn purge_expired_sessions(&self) -> StoreResult<usize> {
        Ok(self.state.write().purge_expired_sessions())
    }
}
