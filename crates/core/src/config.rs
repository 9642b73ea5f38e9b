// Authentication configuration loaded from environment variables.
// Decision: Unset or unknown AUTH_TYPE disables the request filter
// Decision: Unparseable SESSION_DURATION falls back to 0 (sessions never expire)

use std::path::PathBuf;
use std::time::Duration;

use crate::path_matcher::{parse_rules, PathRule};
use crate::session::SessionLifetime;
use crate::strategy::AuthType;

pub const DEFAULT_SESSION_NAME: &str = "_my_session_id";

/// Paths that never require authentication unless overridden
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &[
    "/api/v1/status/",
    "/api/v1/unauthorized/",
    "/api/v1/forbidden/",
    "/api/v1/auth_session/login/",
];

/// Complete authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Strategy selected by `AUTH_TYPE`; `None` disables request authentication
    pub auth_type: Option<AuthType>,
    /// Cookie carrying the session token
    pub session_name: String,
    pub session_lifetime: SessionLifetime,
    pub exempt_paths: Vec<PathRule>,
    /// JSON file backing the identity store; in-memory when absent
    pub store_path: Option<PathBuf>,
    /// Interval of the expired-session sweep; no sweep when absent
    pub sweep_interval: Option<Duration>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_type: None,
            session_name: DEFAULT_SESSION_NAME.to_string(),
            session_lifetime: SessionLifetime::unlimited(),
            exempt_paths: parse_rules(DEFAULT_EXCLUDED_PATHS.iter().copied()),
            store_path: None,
            sweep_interval: None,
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let auth_type = lookup("AUTH_TYPE").and_then(|value| {
            let parsed = AuthType::parse(&value);
            if parsed.is_none() && !value.trim().is_empty() {
                tracing::warn!(auth_type = %value, "Unknown AUTH_TYPE, authentication disabled");
            }
            parsed
        });

        let session_name = lookup("SESSION_NAME")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.session_name);

        let session_lifetime = lookup("SESSION_DURATION")
            .map(|s| SessionLifetime::from_secs(s.trim().parse().unwrap_or(0)))
            .unwrap_or_default();

        let exempt_paths = lookup("AUTH_EXCLUDED_PATHS")
            .map(|s| parse_rules(s.split(',')))
            .unwrap_or(defaults.exempt_paths);

        let store_path = lookup("AUTH_STORE_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let sweep_interval = lookup("SESSION_SWEEP_INTERVAL")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            auth_type,
            session_name,
            session_lifetime,
            exempt_paths,
            store_path,
            sweep_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_matcher::requires_auth;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AuthConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AuthConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.auth_type, None);
        assert_eq!(config.session_name, "_my_session_id");
        assert!(config.session_lifetime.is_unlimited());
        assert!(config.store_path.is_none());
        assert!(config.sweep_interval.is_none());

        assert!(!requires_auth(Some("/api/v1/status"), &config.exempt_paths));
        assert!(!requires_auth(Some("/api/v1/auth_session/login"), &config.exempt_paths));
        assert!(requires_auth(Some("/api/v1/users"), &config.exempt_paths));
    }

    #[test]
    fn test_reads_all_variables() {
        let config = config_from(&[
            ("AUTH_TYPE", "session_db_auth"),
            ("SESSION_NAME", "sid"),
            ("SESSION_DURATION", "60"),
            ("AUTH_EXCLUDED_PATHS", "/api/v1/stat*, /api/v1/open/"),
            ("AUTH_STORE_PATH", "/tmp/identities.json"),
            ("SESSION_SWEEP_INTERVAL", "30"),
        ]);

        assert_eq!(config.auth_type, Some(AuthType::PersistedSession));
        assert_eq!(config.session_name, "sid");
        assert_eq!(config.session_lifetime, SessionLifetime::from_secs(60));
        assert_eq!(config.exempt_paths.len(), 2);
        assert!(!requires_auth(Some("/api/v1/stats"), &config.exempt_paths));
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/identities.json")));
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_bad_duration_means_no_expiry() {
        let config = config_from(&[("SESSION_DURATION", "soon")]);
        assert!(config.session_lifetime.is_unlimited());

        let config = config_from(&[("SESSION_DURATION", "-10")]);
        assert!(config.session_lifetime.is_unlimited());
    }

    #[test]
    fn test_oversized_duration_loads() {
        let max = i64::MAX.to_string();
        let config = config_from(&[("SESSION_DURATION", max.as_str())]);
        assert!(!config.session_lifetime.is_unlimited());
    }

    #[test]
    fn test_unknown_auth_type_disables_filter() {
        assert_eq!(config_from(&[("AUTH_TYPE", "oauth")]).auth_type, None);
        assert_eq!(config_from(&[("AUTH_TYPE", "")]).auth_type, None);
    }

    #[test]
    fn test_empty_excluded_paths_protects_everything() {
        let config = config_from(&[("AUTH_EXCLUDED_PATHS", "")]);
        assert!(config.exempt_paths.is_empty());
        assert!(requires_auth(Some("/api/v1/status"), &config.exempt_paths));
    }
}
