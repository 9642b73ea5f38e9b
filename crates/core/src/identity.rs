// Identity domain types
// Decision: UUIDs generated via uuid v7 (time-ordered)
// Decision: Password digests never leave core/store (redacted Debug, no public view)

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a registered identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(Uuid);

impl IdentityId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse from the textual form stored in cookies and files.
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }

    /// The nil id is never assigned to a stored identity.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for IdentityId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Encoded one-way password hash (PHC string format for Argon2).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
    pub password_digest: PasswordDigest,
    /// Token of the identity-linked session (AuthService flavour)
    pub session_token: Option<String>,
    /// Single outstanding password-reset token
    pub reset_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(email: impl Into<String>, password_digest: PasswordDigest) -> Self {
        let now = Utc::now();
        Self {
            id: IdentityId::new(),
            email: email.into(),
            password_digest,
            session_token: None,
            reset_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when every field set in `filter` equals this identity's value.
    pub fn matches(&self, filter: &IdentityFilter) -> bool {
        filter.id.map_or(true, |id| id == self.id)
            && filter.email.as_deref().map_or(true, |e| e == self.email)
            && filter
                .session_token
                .as_deref()
                .map_or(true, |t| self.session_token.as_deref() == Some(t))
            && filter
                .reset_token
                .as_deref()
                .map_or(true, |t| self.reset_token.as_deref() == Some(t))
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: IdentityUpdate) {
        if let Some(digest) = update.password_digest {
            self.password_digest = digest;
        }
        if let Some(session_token) = update.session_token {
            self.session_token = session_token;
        }
        if let Some(reset_token) = update.reset_token {
            self.reset_token = reset_token;
        }
        self.updated_at = Utc::now();
    }
}

/// Lookup criteria: a partial field set, all given fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityFilter {
    pub id: Option<IdentityId>,
    pub email: Option<String>,
    pub session_token: Option<String>,
    pub reset_token: Option<String>,
}

impl IdentityFilter {
    pub fn by_id(id: IdentityId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn by_session_token(token: impl Into<String>) -> Self {
        Self {
            session_token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn by_reset_token(token: impl Into<String>) -> Self {
        Self {
            reset_token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.email.is_none()
            && self.session_token.is_none()
            && self.reset_token.is_none()
    }
}

/// Partial field set for `IdentityStore::update`.
///
/// `Some(None)` on a token field clears it; `None` leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct IdentityUpdate {
    pub password_digest: Option<PasswordDigest>,
    pub session_token: Option<Option<String>>,
    pub reset_token: Option<Option<String>>,
}

impl IdentityUpdate {
    pub fn is_empty(&self) -> bool {
        self.password_digest.is_none() && self.session_token.is_none() && self.reset_token.is_none()
    }
}

/// Public projection of an identity, safe to serialize to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityView {
    pub id: IdentityId,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Identity> for IdentityView {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

/// Generate a fresh opaque token (32 hex characters)
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new("bob@hbtn.io", PasswordDigest::new("$argon2id$fake"))
    }

    #[test]
    fn test_filter_matches_all_given_fields() {
        let mut user = identity();
        user.session_token = Some("abc".to_string());

        assert!(user.matches(&IdentityFilter::by_email("bob@hbtn.io")));
        assert!(user.matches(&IdentityFilter::by_session_token("abc")));
        assert!(!user.matches(&IdentityFilter::by_reset_token("abc")));

        let filter = IdentityFilter {
            email: Some("bob@hbtn.io".to_string()),
            session_token: Some("other".to_string()),
            ..Default::default()
        };
        assert!(!user.matches(&filter));
    }

    #[test]
    fn test_apply_clears_and_sets_tokens() {
        let mut user = identity();
        user.reset_token = Some("reset".to_string());

        user.apply(IdentityUpdate {
            password_digest: Some(PasswordDigest::new("$argon2id$new")),
            reset_token: Some(None),
            ..Default::default()
        });

        assert_eq!(user.password_digest.as_str(), "$argon2id$new");
        assert_eq!(user.reset_token, None);
        assert_eq!(user.session_token, None);
    }

    #[test]
    fn test_digest_debug_is_redacted() {
        let digest = PasswordDigest::new("$argon2id$secret");
        assert!(!format!("{:?}", digest).contains("secret"));
    }

    #[test]
    fn test_generate_token_is_unique_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_view_omits_digest() {
        let user = identity();
        let json = serde_json::to_value(IdentityView::from(&user)).unwrap();
        assert!(json.get("password_digest").is_none());
        assert_eq!(json["email"], "bob@hbtn.io");
    }
}
