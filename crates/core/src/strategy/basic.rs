// HTTP Basic authentication against the identity store

use async_trait::async_trait;
use std::sync::Arc;

use super::{AuthRequest, AuthStrategy, AuthType};
use crate::credentials;
use crate::identity::Identity;
use crate::password::PasswordHasher;
use crate::traits::IdentityStore;

#[derive(Clone)]
pub struct BasicAuth {
    store: Arc<dyn IdentityStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl BasicAuth {
    pub fn new(store: Arc<dyn IdentityStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }
}

#[async_trait]
impl AuthStrategy for BasicAuth {
    fn kind(&self) -> AuthType {
        AuthType::Basic
    }

    async fn current_identity(&self, request: &AuthRequest) -> Option<Identity> {
        let header = self.authorization_header(request);
        let encoded = credentials::extract_encoded_part(header)?;
        let decoded = credentials::decode(Some(encoded))?;
        let creds = credentials::split_credentials(Some(&decoded))?;
        credentials::resolve_identity(
            self.store.as_ref(),
            self.hasher.as_ref(),
            &creds.email,
            &creds.password,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::encode_basic_header;
    use crate::memory::InMemoryIdentityStore;
    use crate::password::Argon2Hasher;

    async fn setup(email: &str, password: &str) -> (BasicAuth, Identity) {
        let store = Arc::new(InMemoryIdentityStore::new());
        let hasher = Arc::new(Argon2Hasher::new());
        let identity = store
            .add(email, hasher.hash(password).unwrap())
            .await
            .unwrap();
        (BasicAuth::new(store, hasher), identity)
    }

    #[tokio::test]
    async fn test_valid_credentials_resolve() {
        let (auth, identity) = setup("bob100@hbtn.io", "H0lberton:School:98!").await;
        let request = AuthRequest::new("/api/v1/users/me")
            .with_authorization(encode_basic_header("bob100@hbtn.io", "H0lberton:School:98!"));

        let resolved = auth.current_identity(&request).await.unwrap();
        assert_eq!(resolved.id, identity.id);
    }

    #[tokio::test]
    async fn test_wrong_password_resolves_nothing() {
        let (auth, _) = setup("bob@hbtn.io", "toto1234").await;
        let request = AuthRequest::new("/api/v1/users/me")
            .with_authorization(encode_basic_header("bob@hbtn.io", "toto1235"));
        assert!(auth.current_identity(&request).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_email_resolves_nothing() {
        let (auth, _) = setup("bob@hbtn.io", "toto1234").await;
        let request = AuthRequest::new("/api/v1/users/me")
            .with_authorization(encode_basic_header("email@notfound.com", "pwd"));
        assert!(auth.current_identity(&request).await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_headers_resolve_nothing() {
        let (auth, _) = setup("bob@hbtn.io", "toto1234").await;
        for header in ["Bearer abc", "Basic", "Basic !!!notbase64", "Basic SG9sYmVydG9u"] {
            let request = AuthRequest::new("/api/v1/users/me").with_authorization(header);
            assert!(auth.current_identity(&request).await.is_none(), "{}", header);
        }
        assert!(auth.current_identity(&AuthRequest::new("/")).await.is_none());
    }
}
