// Authentication and session-management core
//
// This crate decides, per request, whether a path requires authentication and
// resolves the request's credentials to an identity. It also owns the identity
// lifecycle (registration, login validation, password reset).
//
// Key design decisions:
// - Storage and hashing are collaborators behind traits (IdentityStore, PasswordHasher)
// - Strategies are independent AuthStrategy implementations composed by wrapping
// - The session registry is an injected instance, never process-global state
// - Per-request failures resolve to None; lifecycle failures are AuthError values
// - No HTTP framework dependency: requests are modelled as AuthRequest

pub mod config;
pub mod credentials;
pub mod error;
pub mod file_store;
pub mod identity;
pub mod password;
pub mod path_matcher;
pub mod registry;
pub mod service;
pub mod session;
pub mod strategy;
pub mod traits;

// In-memory implementations for development and testing
pub mod memory;

// Re-exports for convenience
pub use config::AuthConfig;
pub use error::{AuthError, Result, StoreError};
pub use file_store::JsonFileIdentityStore;
pub use identity::{Identity, IdentityFilter, IdentityId, IdentityUpdate, IdentityView, PasswordDigest};
pub use memory::InMemoryIdentityStore;
pub use password::{Argon2Hasher, PasswordHasher};
pub use path_matcher::{requires_auth, PathRule};
pub use registry::{InMemorySessionRegistry, SessionRegistry, StoreSessionRegistry};
pub use service::AuthService;
pub use session::{SessionLifetime, SessionRecord};
pub use strategy::{
    build_strategy, spawn_expiry_sweep, AuthRequest, AuthStrategy, AuthType, BasicAuth, Credential,
    ExpiringSessionAuth, NullAuth, PersistedSessionAuth, SessionAuth, SessionManager,
};
pub use traits::{IdentityStore, StoreResult};
