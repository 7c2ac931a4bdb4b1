//! Model discovery for the chat UI.
//!
//! `/models` proxies the inference backend's own catalogue; `/models/configured`
//! combines admin-managed model configs with whatever a local Ollama daemon
//! reports.  `/settings/default-model` is deliberately public: the login page
//! shows the default model before anyone has a token.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use utoipa::OpenApi;

use crate::entities::{ConfigStore, ModelConfigRecord};
use crate::error::ServerError;
use crate::schemas::models::{
    ConfiguredModelsResponse, CustomModelResponse, DefaultModelResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_models, configured_models, default_model),
    components(schemas(
        ConfiguredModelsResponse,
        CustomModelResponse,
        DefaultModelResponse
    ))
)]
pub struct ModelsApi;

/// Register model routes (mounted on the authenticated `/api` router).
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/models", get(list_models))
        .route("/models/configured", get(configured_models))
}

/// Register the public model routes (no token required).
pub fn public_router() -> Router<Arc<AppState>> {
    Router::new().route("/settings/default-model", get(default_model))
}

/// Proxy the inference backend's model catalogue unmodified.
#[utoipa::path(
    get,
    path = "/api/models",
    tag = "models",
    responses(
        (status = 200, description = "Backend model catalogue", body = Value),
        (status = 401, description = "Missing or invalid token"),
        (status = 502, description = "Inference backend unreachable")
    )
)]
pub async fn list_models(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ServerError> {
    Ok(Json(state.graph.backend_models().await?))
}

/// List models available to the chat picker: active admin-configured models
/// (credentials stripped) plus locally installed Ollama models.
///
/// An unreachable Ollama daemon is not an error; `ollamaModels` is simply
/// empty then.
#[utoipa::path(
    get,
    path = "/api/models/configured",
    tag = "models",
    responses(
        (status = 200, description = "Available models", body = ConfiguredModelsResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn configured_models(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConfiguredModelsResponse>, ServerError> {
    let custom_models: Vec<CustomModelResponse> = state
        .store
        .list_active_model_configs()
        .await?
        .iter()
        .map(ModelConfigRecord::to_picker_response)
        .collect();
    let default_model = custom_models
        .iter()
        .find(|m| m.is_default)
        .map(|m| m.name.clone());
    let ollama_models = state.graph.ollama_models(&state.config.ollama_host).await;
    Ok(Json(ConfiguredModelsResponse {
        custom_models,
        ollama_models,
        default_model,
    }))
}

/// The model name new chats should preselect.
///
/// Reads the `llm.defaultModel` setting; a missing or unreadable setting
/// falls back to the configured server default, so this endpoint never
/// fails.
#[utoipa::path(
    get,
    path = "/api/settings/default-model",
    tag = "models",
    responses(
        (status = 200, description = "Default model name", body = DefaultModelResponse)
    )
)]
pub async fn default_model(State(state): State<Arc<AppState>>) -> Json<DefaultModelResponse> {
    let stored = match state.store.get_setting("llm.defaultModel").await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read default model setting");
            None
        }
    };
    Json(DefaultModelResponse {
        default_model: stored
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| state.config.default_model.clone()),
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::entities::ConfigStore;
    use crate::routes;
    use crate::test_support::{bearer, get, json_body, seed_model, seed_user, state};

    #[tokio::test]
    async fn configured_models_lists_active_ones_and_names_the_default() {
        let state = state().await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        seed_model(&state, "qwen3:32b", true, true).await;
        seed_model(&state, "llama3:8b", false, true).await;
        seed_model(&state, "retired", false, false).await;
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(get("/api/models/configured", Some(&bearer(&state, &user))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;

        let custom = body["customModels"].as_array().unwrap();
        assert_eq!(custom.len(), 2);
        // Default first, credentials stripped.
        assert_eq!(custom[0]["name"], "qwen3:32b");
        assert!(custom[0].get("apiKey").is_none());
        assert_eq!(body["defaultModel"], "qwen3:32b");
        // No Ollama daemon in tests.
        assert!(body["ollamaModels"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn configured_models_with_no_default_reports_null() {
        let state = state().await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        seed_model(&state, "llama3:8b", false, true).await;
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(get("/api/models/configured", Some(&bearer(&state, &user))))
            .await
            .unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["defaultModel"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn default_model_is_public_and_falls_back_to_the_server_default() {
        let state = state().await;
        let app = routes::build(state.clone());

        let resp = app
            .clone()
            .oneshot(get("/api/settings/default-model", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["defaultModel"], "qwen3:32b");

        state
            .store
            .upsert_setting("llm.defaultModel", "llama3:70b", "llm")
            .await
            .unwrap();
        let resp = app
            .oneshot(get("/api/settings/default-model", None))
            .await
            .unwrap();
        assert_eq!(json_body(resp).await["defaultModel"], "llama3:70b");
    }

    #[tokio::test]
    async fn model_catalogue_maps_a_dead_backend_to_502() {
        let state = state().await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(get("/api/models", Some(&bearer(&state, &user))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            json_body(resp).await["error"],
            "inference backend unavailable"
        );
    }
}
