// Session records
//
// A session is Created on login, Active until either its deadline passes
// (Expired, lazily: the record stays but resolves to nothing) or it is
// explicitly destroyed (terminal).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{generate_token, IdentityId};

/// Metadata stored per session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub identity_id: IdentityId,
    pub created_at: DateTime<Utc>,
    /// Absent means the session never expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Create a record with a fresh token.
    pub fn new(identity_id: IdentityId, lifetime: SessionLifetime) -> Self {
        let created_at = Utc::now();
        Self {
            token: generate_token(),
            identity_id,
            created_at,
            expires_at: lifetime.deadline(created_at),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| deadline < now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Configured session duration.
///
/// Zero or negative durations mean "never expires".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionLifetime(Option<Duration>);

impl SessionLifetime {
    pub fn unlimited() -> Self {
        Self(None)
    }

    pub fn new(duration: Duration) -> Self {
        if duration <= Duration::zero() {
            Self(None)
        } else {
            Self(Some(duration))
        }
    }

    /// Seconds beyond what `chrono` can represent saturate to the largest duration.
    pub fn from_secs(secs: i64) -> Self {
        Self::new(Duration::try_seconds(secs).unwrap_or(Duration::MAX))
    }

    pub fn duration(&self) -> Option<Duration> {
        self.0
    }

    pub fn is_unlimited(&self) -> bool {
        self.0.is_none()
    }

    /// `created_at + duration`, or `None` when the session never expires.
    /// A deadline past the representable range also means "never expires".
    pub fn deadline(&self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.0.and_then(|duration| created_at.checked_add_signed(duration))
    }
}
