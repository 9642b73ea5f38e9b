// Password hashing using Argon2id
// Decision: Use Argon2id as it's the recommended algorithm for password hashing
// Decision: Use default parameters which are secure for most use cases
// Decision: Hashing sits behind a trait so tests and deployments can swap it

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{AuthError, Result};
use crate::identity::PasswordDigest;

/// One-way hash and verify of a cleartext secret.
pub trait PasswordHasher: Send + Sync {
    /// Hash a cleartext password into a storable digest
    fn hash(&self, cleartext: &str) -> Result<PasswordDigest>;

    /// Verify a cleartext password against a digest.
    /// A digest that cannot be parsed never verifies.
    fn verify(&self, cleartext: &str, digest: &PasswordDigest) -> bool;
}

/// Argon2id hasher with a random salt per hash
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, cleartext: &str) -> Result<PasswordDigest> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(cleartext.as_bytes(), &salt)
            .map_err(|e| AuthError::hashing(format!("Failed to hash password: {}", e)))?;

        Ok(PasswordDigest::new(hash.to_string()))
    }

    fn verify(&self, cleartext: &str, digest: &PasswordDigest) -> bool {
        let Ok(parsed) = PasswordHash::new(digest.as_str()) else {
            tracing::warn!("Stored password digest could not be parsed");
            return false;
        };

        Argon2::default()
            .verify_password(cleartext.as_bytes(), &parsed)
            .is_ok()
    }
}
