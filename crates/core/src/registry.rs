// Session registries: token -> session metadata
// Decision: Registry is an explicitly owned, injected instance (no process-wide map)
// Decision: In-memory backend guards its map with one parking_lot RwLock; remove is linearizable per token
//
// Lookups return the raw record. Expiry is a policy of the strategy that owns
// the registry, so an expired record stays until destroyed or swept.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::session::SessionRecord;
use crate::traits::{IdentityStore, StoreResult};

/// Backing store for session records
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Store a record under its token. An error means the record is not
    /// retrievable and the token must not be handed out.
    async fn insert(&self, record: SessionRecord) -> StoreResult<()>;

    /// Record for `token`, if present (expired records included).
    async fn get(&self, token: &str) -> Option<SessionRecord>;

    /// Remove and return the record. Of two concurrent removals of the same
    /// token, exactly one observes `Some`.
    async fn remove(&self, token: &str) -> Option<SessionRecord>;

    /// Drop records whose deadline is before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> usize;
}

// ============================================================================
// InMemorySessionRegistry
// ============================================================================

/// Process-local registry
#[derive(Debug, Default)]
pub struct InMemorySessionRegistry {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    async fn insert(&self, record: SessionRecord) -> StoreResult<()> {
        self.sessions.write().insert(record.token.clone(), record);
        Ok(())
    }

    async fn get(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.read().get(token).cloned()
    }

    async fn remove(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.write().remove(token)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired_at(now));
        before - sessions.len()
    }
}

// ============================================================================
// StoreSessionRegistry
// ============================================================================

/// Registry persisted through the identity store's session table
#[derive(Clone)]
pub struct StoreSessionRegistry {
    store: Arc<dyn IdentityStore>,
}

impl StoreSessionRegistry {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionRegistry for StoreSessionRegistry {
    async fn insert(&self, record: SessionRecord) -> StoreResult<()> {
        self.store.insert_session(record).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to persist session record");
            e
        })
    }

    async fn get(&self, token: &str) -> Option<SessionRecord> {
        self.store.find_session(token).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load session record");
            None
        })
    }

    async fn remove(&self, token: &str) -> Option<SessionRecord> {
        let record = self.get(token).await?;
        match self.store.remove_session(token).await {
            Ok(true) => Some(record),
            Ok(false) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to remove session record");
                None
            }
        }
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> usize {
        self.store.purge_expired_sessions().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to purge expired session records");
            0
        })
    }
}
