// Exempt-path matching for the request filter
//
// A rule is either a literal path (slash tolerant: "/a/b" and "/a/b/" are the
// same rule) or a wildcard prefix ("/api/v1/stat*" matches anything starting
// with "/api/v1/stat").

use std::fmt;

/// Marker that turns a rule into a prefix rule when it ends the pattern.
pub const WILDCARD: char = '*';

/// A single exemption rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRule {
    /// Literal path, stored with a trailing slash
    Exact(String),
    /// Literal prefix preceding the wildcard marker
    Prefix(String),
}

impl PathRule {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix(WILDCARD) {
            Some(prefix) => PathRule::Prefix(prefix.to_string()),
            None => PathRule::Exact(with_trailing_slash(pattern)),
        }
    }

    /// Whether `path` (already slash-normalized) is covered by this rule.
    fn covers(&self, normalized_path: &str) -> bool {
        match self {
            PathRule::Exact(rule) => rule == normalized_path,
            PathRule::Prefix(prefix) => normalized_path.starts_with(prefix.as_str()),
        }
    }
}

impl From<&str> for PathRule {
    fn from(pattern: &str) -> Self {
        PathRule::parse(pattern)
    }
}

impl fmt::Display for PathRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathRule::Exact(path) => f.write_str(path),
            PathRule::Prefix(prefix) => write!(f, "{}{}", prefix, WILDCARD),
        }
    }
}

/// Parse a list of patterns into rules, skipping blank entries.
pub fn parse_rules<I, S>(patterns: I) -> Vec<PathRule>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| p.as_ref().trim().to_string())
        .filter(|p| !p.is_empty())
        .map(|p| PathRule::parse(&p))
        .collect()
}

/// Decide whether `path` requires authentication.
///
/// - Missing or empty path: required
/// - No rules: required
/// - First matching rule exempts the path
pub fn requires_auth(path: Option<&str>, exempt: &[PathRule]) -> bool {
    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return true;
    };

    if exempt.is_empty() {
        return true;
    }

    let normalized = with_trailing_slash(path);
    !exempt.iter().any(|rule| rule.covers(&normalized))
}

fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(patterns: &[&str]) -> Vec<PathRule> {
        parse_rules(patterns)
    }

    #[test]
    fn test_missing_path_requires_auth() {
        assert!(requires_auth(None, &[]));
        assert!(requires_auth(None, &rules(&["/api/v1/status/"])));
        assert!(requires_auth(Some(""), &rules(&["/api/v1/status/"])));
    }

    #[test]
    fn test_no_rules_requires_auth() {
        assert!(requires_auth(Some("/api/v1/status/"), &[]));
        assert!(requires_auth(Some("/"), &[]));
    }

    #[test]
    fn test_slash_tolerance_both_directions() {
        let exempt = rules(&["/api/v1/status/"]);
        assert!(!requires_auth(Some("/api/v1/status"), &exempt));
        assert!(!requires_auth(Some("/api/v1/status/"), &exempt));

        let exempt = rules(&["/api/v1/status"]);
        assert!(!requires_auth(Some("/api/v1/status/"), &exempt));
    }

    #[test]
    fn test_unmatched_path_requires_auth() {
        let exempt = rules(&["/api/v1/status", "/api/v1/stats"]);
        assert!(requires_auth(Some("/api/v1/players"), &exempt));
        assert!(requires_auth(Some("/api/v1/statsx"), &exempt));
    }

    #[test]
    fn test_wildcard_prefix() {
        let exempt = rules(&["/api/v1/stat*"]);
        assert!(!requires_auth(Some("/api/v1/stats"), &exempt));
        assert!(!requires_auth(Some("/api/v1/status/"), &exempt));
        assert!(requires_auth(Some("/api/v1/users"), &exempt));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(PathRule::parse("/a/b"), PathRule::Exact("/a/b/".to_string()));
        assert_eq!(PathRule::parse("/a/*"), PathRule::Prefix("/a/".to_string()));
        assert_eq!(PathRule::parse("/a/*").to_string(), "/a/*");
        assert_eq!(parse_rules([" /a ", "", "  "]).len(), 1);
    }
}
