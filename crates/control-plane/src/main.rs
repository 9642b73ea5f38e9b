// Gatehouse API server
// Decision: Identity store is in-memory unless AUTH_STORE_PATH points at a JSON file
// Decision: CORS is only enabled when CORS_ALLOWED_ORIGINS is set

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use gatehouse_control_plane::telemetry::{init_telemetry, TelemetryConfig};
use gatehouse_control_plane::{build_router, AppState};
use gatehouse_core::{
    spawn_expiry_sweep, Argon2Hasher, AuthConfig, IdentityStore, InMemoryIdentityStore,
    JsonFileIdentityStore, PasswordHasher,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading any configuration
    dotenvy::dotenv().ok();

    // Configure via environment variables:
    // - RUST_LOG: Log filter (default: "gatehouse_control_plane=debug,gatehouse_core=debug,tower_http=debug")
    let mut telemetry_config = TelemetryConfig::from_env();
    if telemetry_config.service_name == "gatehouse" {
        telemetry_config.service_name = "gatehouse-control-plane".to_string();
    }
    telemetry_config.service_version = Some(env!("CARGO_PKG_VERSION").to_string());
    init_telemetry(telemetry_config);

    tracing::info!("gatehouse-api starting...");

    // Load authentication configuration
    let auth_config = AuthConfig::from_env();
    tracing::info!(
        auth_type = auth_config.auth_type.map(|t| t.as_str()).unwrap_or("none"),
        session_name = %auth_config.session_name,
        exempt_paths = auth_config.exempt_paths.len(),
        "Authentication configured"
    );

    // Identity store
    let store: Arc<dyn IdentityStore> = match &auth_config.store_path {
        Some(path) => {
            let store = JsonFileIdentityStore::open(path)
                .await
                .with_context(|| format!("Failed to open identity store at {}", path.display()))?;
            tracing::info!(path = %path.display(), "Using JSON file identity store");
            Arc::new(store)
        }
        None => {
            tracing::info!("Using in-memory identity store");
            Arc::new(InMemoryIdentityStore::new())
        }
    };
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new());

    let state = AppState::new(&auth_config, store, hasher);

    // Optional expired-session sweep
    if let (Some(interval), Some(strategy)) = (auth_config.sweep_interval, state.strategy.clone()) {
        if spawn_expiry_sweep(strategy, interval).is_some() {
            tracing::info!(interval_secs = interval.as_secs(), "Session expiry sweep enabled");
        }
    }

    // Load CORS allowed origins from environment (optional)
    // Example: CORS_ALLOWED_ORIGINS="https://app.example.com,https://admin.example.com"
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    let app = build_router(state);

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    // Start HTTP server
    let host = std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("API_PORT").unwrap_or_else(|_| "5000".to_string());
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
