// Core traits for pluggable backends
//
// These traits allow the auth core to be used with different backends:
// - In-memory implementations for dev mode and testing
// - File-backed implementations that survive restarts
// - Database implementations living outside this crate

use async_trait::async_trait;

use crate::error::StoreError;
use crate::identity::{Identity, IdentityFilter, IdentityId, IdentityUpdate, PasswordDigest};
use crate::session::SessionRecord;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ============================================================================
// IdentityStore - Identity records and durable sessions
// ============================================================================

/// Lookup, insert and update of identity records.
///
/// Implementations must apply each `update` atomically: either every field of
/// the `IdentityUpdate` is written or none is.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// First identity matching every field of `filter`.
    /// An empty filter is rejected with `StoreError::InvalidField`.
    async fn find_by(&self, filter: &IdentityFilter) -> StoreResult<Option<Identity>>;

    /// Insert a new identity. Duplicate emails are rejected with `Conflict`.
    async fn add(&self, email: &str, password_digest: PasswordDigest) -> StoreResult<Identity>;

    /// Apply a partial update and return the updated identity.
    async fn update(&self, id: IdentityId, update: IdentityUpdate) -> StoreResult<Identity>;

    /// Persist a session record.
    async fn insert_session(&self, record: SessionRecord) -> StoreResult<()>;

    /// Look up a persisted session by token.
    async fn find_session(&self, token: &str) -> StoreResult<Option<SessionRecord>>;

    /// Remove a persisted session, returning whether it existed.
    async fn remove_session(&self, token: &str) -> StoreResult<bool>;

    /// Drop persisted sessions whose deadline has passed.
    async fn purge_expired_sessions(&self) -> StoreResult<usize> {
        Ok(0)
    }
}
