// Gatehouse Control Plane Library
// Decision: Router assembly lives here so the binary and tests share it

use axum::Router;
use gatehouse_core::{
    build_strategy, AuthConfig, AuthService, AuthStrategy, IdentityStore, PasswordHasher, PathRule,
};
use std::sync::Arc;

// API routes and error mapping
pub mod api;

// Request filter and /api/v1 routes
pub mod auth;

// Logging bootstrap
pub mod telemetry;

/// App state shared across routes
#[derive(Clone)]
pub struct AppState {
    /// Configured request strategy; `None` disables the request filter
    pub strategy: Option<Arc<dyn AuthStrategy>>,
    pub exempt_paths: Arc<Vec<PathRule>>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(
        config: &AuthConfig,
        store: Arc<dyn IdentityStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let strategy = build_strategy(config, store.clone(), hasher.clone());
        Self {
            strategy,
            exempt_paths: Arc::new(config.exempt_paths.clone()),
            auth_service: Arc::new(AuthService::new(store, hasher)),
        }
    }
}

/// Build the application router: filtered /api/v1 routes plus the user service.
pub fn build_router(state: AppState) -> Router {
    let api_routes = auth::routes(state.clone()).layer(axum::middleware::from_fn_with_state(
        state.clone(),
        auth::require_identity,
    ));

    Router::new()
        .merge(api_routes)
        .merge(api::users::routes(state))
}
