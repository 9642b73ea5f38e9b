// Identity lifecycle: registration, login, identity-linked sessions, password reset
// Decision: Independent of the per-request AuthStrategy; talks to IdentityStore directly
// Decision: Read-modify-write sequences are serialized by one async mutex
// Decision: Destroying a session for an identity with no active token is a no-op

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{AuthError, Result, StoreError};
use crate::identity::{generate_token, Identity, IdentityFilter, IdentityId, IdentityUpdate};
use crate::password::PasswordHasher;
use crate::traits::IdentityStore;

pub struct AuthService {
    store: Arc<dyn IdentityStore>,
    hasher: Arc<dyn PasswordHasher>,
    write_lock: Mutex<()>,
}

impl AuthService {
    pub fn new(store: Arc<dyn IdentityStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            store,
            hasher,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn IdentityStore> {
        &self.store
    }

    pub fn hasher(&self) -> &Arc<dyn PasswordHasher> {
        &self.hasher
    }

    // ========================================================================
    // Registration and login
    // ========================================================================

    /// Register a new identity.
    ///
    /// Fails with `DuplicateIdentity` without touching the existing record
    /// when the email is taken.
    pub async fn register_identity(&self, email: &str, password: &str) -> Result<Identity> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::invalid_argument("email is required"));
        }
        if password.is_empty() {
            return Err(AuthError::invalid_argument("password is required"));
        }

        let _guard = self.write_lock.lock().await;

        if self.find_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity(email.to_string()));
        }

        let digest = self.hasher.hash(password)?;
        let identity = self.store.add(email, digest).await.map_err(|e| match e {
            StoreError::Conflict(_) => AuthError::DuplicateIdentity(email.to_string()),
            other => AuthError::Store(other),
        })?;

        tracing::info!(identity_id = %identity.id, "Identity registered");
        Ok(identity)
    }

    /// True only for an existing email whose digest verifies `password`.
    pub async fn validate_login(&self, email: &str, password: &str) -> bool {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return false;
        }
        match self.find_by_email(email).await {
            Ok(Some(identity)) => self.hasher.verify(password, &identity.password_digest),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Identity lookup failed during login validation");
                false
            }
        }
    }

    // ========================================================================
    // Identity-linked sessions
    // ========================================================================

    /// Store a fresh session token on the identity; `None` for an unknown email.
    pub async fn create_session(&self, email: &str) -> Result<Option<String>> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }

        let _guard = self.write_lock.lock().await;

        let Some(identity) = self.find_by_email(email).await? else {
            return Ok(None);
        };

        let token = generate_token();
        self.store
            .update(
                identity.id,
                IdentityUpdate {
                    session_token: Some(Some(token.clone())),
                    ..Default::default()
                },
            )
            .await?;

        tracing::debug!(identity_id = %identity.id, "Identity session created");
        Ok(Some(token))
    }

    pub async fn identity_for_session_token(&self, token: &str) -> Result<Option<Identity>> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self
            .store
            .find_by(&IdentityFilter::by_session_token(token))
            .await?)
    }

    /// Clear the identity's session token.
    pub async fn destroy_session(&self, identity_id: IdentityId) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let identity = self
            .identity_by_id(identity_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        if identity.session_token.is_none() {
            return Ok(());
        }

        self.store
            .update(
                identity.id,
                IdentityUpdate {
                    session_token: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        tracing::debug!(identity_id = %identity.id, "Identity session destroyed");
        Ok(())
    }

    // ========================================================================
    // Password reset
    // ========================================================================

    /// Issue a reset token, replacing any outstanding one.
    pub async fn issue_reset_token(&self, email: &str) -> Result<String> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::IdentityNotFound);
        }

        let _guard = self.write_lock.lock().await;

        let identity = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        let token = generate_token();
        self.store
            .update(
                identity.id,
                IdentityUpdate {
                    reset_token: Some(Some(token.clone())),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(identity_id = %identity.id, "Reset token issued");
        Ok(token)
    }

    /// Replace the password and clear the reset token in a single update.
    pub async fn redeem_reset_token(&self, token: &str, new_password: &str) -> Result<()> {
        if token.is_empty() {
            return Err(AuthError::InvalidResetToken);
        }
        if new_password.is_empty() {
            return Err(AuthError::invalid_argument("new password is required"));
        }

        let _guard = self.write_lock.lock().await;

        let identity = self
            .store
            .find_by(&IdentityFilter::by_reset_token(token))
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let digest = self.hasher.hash(new_password)?;
        self.store
            .update(
                identity.id,
                IdentityUpdate {
                    password_digest: Some(digest),
                    reset_token: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(identity_id = %identity.id, "Password reset");
        Ok(())
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub async fn identity_by_id(&self, id: IdentityId) -> Result<Option<Identity>> {
        Ok(self.store.find_by(&IdentityFilter::by_id(id)).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let email = normalize_email(email);
        Ok(self.store.find_by(&IdentityFilter::by_email(email)).await?)
    }
}

/// Emails are stored and looked up without surrounding whitespace.
fn normalize_email(email: &str) -> &str {
    email.trim()
}
