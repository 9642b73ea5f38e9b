// JSON file-backed identity storage
// Decision: Keep the whole state in memory and snapshot it to one JSON file after each mutation
// Decision: Snapshots are written to a sibling temp file and renamed into place
//
// Persisted sessions and identities survive a restart, which the in-memory
// store cannot offer. Suitable for single-process deployments.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::identity::{Identity, IdentityFilter, IdentityId, IdentityUpdate, PasswordDigest};
use crate::memory::StoreState;
use crate::session::SessionRecord;
use crate::traits::{IdentityStore, StoreResult};

/// Identity store persisted as a JSON document
#[derive(Debug)]
pub struct JsonFileIdentityStore {
    path: PathBuf,
    state: RwLock<StoreState>,
    // Serializes mutate+flush so snapshots land on disk in mutation order
    write_gate: Mutex<()>,
}

impl JsonFileIdentityStore {
    /// Open the store, loading existing content if the file is present.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => StoreState::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), "Opened identity store file");

        Ok(Self {
            path,
            state: RwLock::new(state),
            write_gate: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a mutation against a copy of the state, flush it, then publish it.
    ///
    /// The in-memory state only changes once the snapshot is on disk.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let _gate = self.write_gate.lock().await;

        let mut next = self.state.read().clone();
        let value = f(&mut next)?;
        let snapshot = serde_json::to_vec_pretty(&next)?;

        self.flush(snapshot).await?;
        *self.state.write() = next;
        Ok(value)
    }

    async fn flush(&self, snapshot: Vec<u8>) -> StoreResult<()> {
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, snapshot).await?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to persist identity store");
            StoreError::from(e)
        })
    }
}

#[async_trait]
impl IdentityStore for JsonFileIdentityStore {
    async fn find_by(&self, filter: &IdentityFilter) -> StoreResult<Option<Identity>> {
        self.state.read().find_by(filter)
    }

    async fn add(&self, email: &str, password_digest: PasswordDigest) -> StoreResult<Identity> {
        self.mutate(|state| state.add(email, password_digest)).await
    }

    async fn update(&self, id: IdentityId, update: IdentityUpdate) -> StoreResult<Identity> {
        self.mutate(|state| state.update(id, update)).await
    }

    async fn insert_session(&self, record: SessionRecord) -> StoreResult<()> {
        self.mutate(|state| state.insert_session(record)).await
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<SessionRecord>> {
        Ok(self.state.read().find_session(token))
    }

    async fn remove_session(&self, token: &str) -> StoreResult<bool> {
        self.mutate(|state| Ok(state.remove_session(token))).await
    }

    async fn purge_expired_sessions(&self) -> StoreResult<usize> {
        self.mutate(|state| Ok(state.purge_expired_sessions())).await
    }
}
