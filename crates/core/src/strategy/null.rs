// Explicit "no authentication" mode: path rules apply, no identity ever resolves

use async_trait::async_trait;

use super::{AuthRequest, AuthStrategy, AuthType};
use crate::identity::Identity;

#[derive(Debug, Clone, Default)]
pub struct NullAuth;

impl NullAuth {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuthStrategy for NullAuth {
    fn kind(&self) -> AuthType {
        AuthType::Null
    }

    async fn current_identity(&self, _request: &AuthRequest) -> Option<Identity> {
        None
    }
}
