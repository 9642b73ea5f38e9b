// Basic credential pipeline
//
// header -> encoded part -> decoded text -> (email, password) -> identity.
// Every stage is total: a rejection yields `None`, never an error, so the
// request filter can short-circuit to "no identity".

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::AuthError;
use crate::identity::{Identity, IdentityFilter};
use crate::password::PasswordHasher;
use crate::traits::IdentityStore;

/// Scheme marker, case sensitive, single trailing space
pub const BASIC_SCHEME: &str = "Basic ";

/// Separator between email and password in the decoded payload
pub const CREDENTIAL_SEPARATOR: char = ':';

/// Email / password pair carried by a Basic header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Stage 1: the substring after `"Basic "`.
pub fn extract_encoded_part(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix(BASIC_SCHEME)
}

/// Stage 2: base64 decode and reinterpret as UTF-8.
pub fn decode(encoded: Option<&str>) -> Option<String> {
    try_decode(encoded?).ok()
}

/// Stage 2 with the failure kind kept, for diagnostics.
pub fn try_decode(encoded: &str) -> Result<String, AuthError> {
    if encoded.is_empty() {
        return Err(AuthError::MalformedBase64);
    }
    let bytes = BASE64
        .decode(encoded)
        .map_err(|_| AuthError::MalformedBase64)?;
    String::from_utf8(bytes).map_err(|_| AuthError::MalformedBase64)
}

/// Stage 3: split on the first separator only.
///
/// The password may contain `:`; the email may not.
pub fn split_credentials(decoded: Option<&str>) -> Option<BasicCredentials> {
    let (email, password) = decoded?.split_once(CREDENTIAL_SEPARATOR)?;
    Some(BasicCredentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Stage 4: look up by email and verify the password.
pub async fn resolve_identity(
    store: &dyn IdentityStore,
    hasher: &dyn PasswordHasher,
    email: &str,
    password: &str,
) -> Option<Identity> {
    if email.is_empty() || password.is_empty() {
        return None;
    }

    let identity = match store.find_by(&IdentityFilter::by_email(email)).await {
        Ok(Some(identity)) => identity,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, "Identity lookup failed during Basic authentication");
            return None;
        }
    };

    if !hasher.verify(password, &identity.password_digest) {
        tracing::debug!(identity_id = %identity.id, "Basic credential password mismatch");
        return None;
    }

    Some(identity)
}

/// Stages 1 to 3 composed: header value to credential pair.
pub fn parse_basic_header(header: Option<&str>) -> Option<BasicCredentials> {
    let encoded = extract_encoded_part(header)?;
    let decoded = decode(Some(encoded))?;
    split_credentials(Some(&decoded))
}

/// Build a header value for `email:password` (clients and tests).
pub fn encode_basic_header(email: &str, password: &str) -> String {
    format!(
        "{}{}",
        BASIC_SCHEME,
        BASE64.encode(format!("{}{}{}", email, CREDENTIAL_SEPARATOR, password))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_requires_exact_scheme() {
        assert_eq!(extract_encoded_part(Some("Basic SG9sYmVydG9u")), Some("SG9sYmVydG9u"));
        assert_eq!(extract_encoded_part(Some("Basic ")), Some(""));
        assert_eq!(extract_encoded_part(None), None);
        assert_eq!(extract_encoded_part(Some("Holberton")), None);
        assert_eq!(extract_encoded_part(Some("basic SG9sYmVydG9u")), None);
        assert_eq!(extract_encoded_part(Some("Basic")), None);
        assert_eq!(extract_encoded_part(Some("Bearer SG9sYmVydG9u")), None);
    }

    #[test]
    fn test_extract_keeps_payload_verbatim() {
        // Only the scheme is removed, even if the payload starts with scheme letters
        assert_eq!(extract_encoded_part(Some("Basic Basic")), Some("Basic"));
        assert_eq!(extract_encoded_part(Some("Basic cisa")), Some("cisa"));
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(Some("SG9sYmVydG9u")), Some("Holberton".to_string()));
        assert_eq!(decode(Some("SG9sYmVydG9uIFNjaG9vbA==")), Some("Holberton School".to_string()));
        assert_eq!(decode(Some("Holberton")), None);
        assert_eq!(decode(Some("")), None);
        assert_eq!(decode(None), None);
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let encoded = BASE64.encode([0xff, 0xfe, 0xfd]);
        assert_eq!(decode(Some(&encoded)), None);
        assert!(matches!(try_decode(&encoded), Err(AuthError::MalformedBase64)));
    }

    #[test]
    fn test_split_on_first_separator() {
        let creds = split_credentials(Some("Holberton:School")).unwrap();
        assert_eq!(creds.email, "Holberton");
        assert_eq!(creds.password, "School");

        let creds = split_credentials(Some("user@x.com:pa:ss:word")).unwrap();
        assert_eq!(creds.email, "user@x.com");
        assert_eq!(creds.password, "pa:ss:word");

        assert_eq!(split_credentials(Some("Holberton School")), None);
        assert_eq!(split_credentials(None), None);
    }

    #[test]
    fn test_header_round_trip() {
        let header = encode_basic_header("bob@gmail.com", "toto1234");
        let creds = parse_basic_header(Some(&header)).unwrap();
        assert_eq!(creds.email, "bob@gmail.com");
        assert_eq!(creds.password, "toto1234");
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = split_credentials(Some("a@b.c:secret")).unwrap();
        assert!(!format!("{:?}", creds).contains("secret"));
    }
}
