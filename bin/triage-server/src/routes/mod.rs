//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Optional Swagger UI / OpenAPI spec endpoint (disable with `TRIAGE_ENABLE_SWAGGER=false`)
//! - Health / heartbeat route
//! - The `/api` surface: a small public slice (login, default model, graph
//!   info) and the token-protected rest, with `/api/admin` further gated on
//!   the admin role

mod admin;
mod auth;
mod cases;
mod chat;
mod chats;
mod collect;
pub mod doc;
mod graph;
mod groups;
mod health;
mod models;

use std::sync::Arc;

use axum::{Router, middleware::from_fn_with_state};
use tower::ServiceBuilder;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::auth::require_auth;
use crate::middleware::{cors, trace};
use crate::state::AppState;

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    // Reachable without a token: sign-in, the public default-model probe and
    // the knowledge-graph summary the landing page renders.
    let public = auth::router()
        .merge(models::public_router())
        .merge(graph::router());

    let protected = chat::router()
        .merge(chats::router())
        .merge(groups::router())
        .merge(models::router())
        .merge(cases::router())
        .merge(collect::router())
        .nest("/admin", admin::router())
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let mut app = Router::new()
        .merge(health::router())
        .nest("/api", public.merge(protected));

    // ── Swagger UI ────────────────────────────────────────────────────────────
    // Enabled by default; disable with TRIAGE_ENABLE_SWAGGER=false in
    // production to avoid exposing the API structure.
    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(&state)))
        .layer(axum::middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
