//! Admin dashboard routes, all gated behind [`require_admin`].
//!
//! The gate reads the claims [`crate::middleware::auth::require_auth`]
//! stored in request extensions, so this router must be nested inside the
//! authenticated `/api` surface.

pub mod groups;
pub mod models;
pub mod rag;
pub mod settings;
pub mod users;

use std::sync::Arc;

use axum::{Router, middleware};

use crate::middleware::auth::require_admin;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    users::router()
        .merge(groups::router())
        .merge(models::router())
        .merge(settings::router())
        .merge(rag::router())
        .route_layer(middleware::from_fn(require_admin))
}

/// Combined OpenAPI document for the admin surface.
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi;

    let mut docs = users::UsersApi::openapi();
    docs.merge(groups::GroupsApi::openapi());
    docs.merge(models::ModelsApi::openapi());
    docs.merge(settings::SettingsApi::openapi());
    docs.merge(rag::RagApi::openapi());
    docs
}
