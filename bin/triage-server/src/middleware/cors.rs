use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Wildcard in development; set `TRIAGE_CORS_ORIGINS` (comma-separated) to
/// restrict in production.
pub fn cors_layer(state: &Arc<AppState>) -> CorsLayer {
    let Some(origins_str) = &state.config.cors_allowed_origins else {
        return permissive();
    };
    let origins: Vec<axum::http::HeaderValue> = origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    if origins.is_empty() {
        return permissive();
    }
    CorsLayer::new()
        .allow_origin(origins)
        .allow_headers(Any)
        .allow_methods(Any)
}

fn permissive() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any)
}
