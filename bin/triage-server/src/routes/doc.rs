//! OpenAPI document assembly.
//!
//! Each route module declares its own `#[derive(OpenApi)]` struct; this module
//! merges them into the single document served under `/api-docs/openapi.json`
//! and rendered by Swagger UI when `enable_swagger` is set.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "triage-server",
    description = "Chat relay and failure-analysis triage backend: streams \
                   model replies from the inference graph, records transcripts, \
                   and manages analysis cases, guided data collection and admin \
                   configuration.",
    version = env!("CARGO_PKG_VERSION"),
))]
pub struct ApiDoc;

/// Merge every route module's OpenAPI fragment into one document.
pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut docs = ApiDoc::openapi();
    docs.merge(super::health::HealthApi::openapi());
    docs.merge(super::auth::AuthApi::openapi());
    docs.merge(super::chat::ChatApi::openapi());
    docs.merge(super::chats::ChatsApi::openapi());
    docs.merge(super::groups::GroupsApi::openapi());
    docs.merge(super::models::ModelsApi::openapi());
    docs.merge(super::graph::GraphApi::openapi());
    docs.merge(super::cases::CasesApi::openapi());
    docs.merge(super::collect::CollectApi::openapi());
    docs.merge(super::admin::api_docs());
    docs
}

// ── Tests ──────────────────────────────────────────────────────────────────────
