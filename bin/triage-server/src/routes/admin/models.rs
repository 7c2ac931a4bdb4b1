//! Model-config administration.
//!
//! At most one config carries the default flag; electing a new default
//! clears the flag everywhere else first.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::{ConfigStore, ModelConfigRecord};
use crate::error::ServerError;
use crate::schemas::admin::models::{AdminModelResponse, CreateModelRequest, UpdateModelRequest};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_models, create_model, get_model, update_model, delete_model),
    components(schemas(AdminModelResponse, CreateModelRequest, UpdateModelRequest))
)]
pub struct ModelsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/models", get(list_models).post(create_model))
        .route(
            "/models/{id}",
            get(get_model).patch(update_model).delete(delete_model),
        )
}

/// Every config, default first, then newest.
#[utoipa::path(
    get,
    path = "/api/admin/models",
    tag = "admin",
    responses(
        (status = 200, description = "All model configs", body = Vec<AdminModelResponse>),
        (status = 403, description = "Caller is not an admin")
    )
)]
async fn list_models(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminModelResponse>>, ServerError> {
    let models = state.store.list_model_configs().await?;
    Ok(Json(models.iter().map(|m| m.to_admin_response()).collect()))
}

#[utoipa::path(
    post,
    path = "/api/admin/models",
    tag = "admin",
    request_body = CreateModelRequest,
    responses(
        (status = 200, description = "Model config created", body = AdminModelResponse),
        (status = 400, description = "Missing name or display name")
    )
)]
async fn create_model(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateModelRequest>,
) -> Result<Json<AdminModelResponse>, ServerError> {
    let name = req.name.filter(|n| !n.is_empty());
    let display_name = req.display_name.filter(|n| !n.is_empty());
    let (Some(name), Some(display_name)) = (name, display_name) else {
        return Err(ServerError::BadRequest(
            "Name and display name are required".into(),
        ));
    };

    let is_default = req.is_default.unwrap_or(false);
    if is_default {
        state.store.clear_default_model_flags().await?;
    }

    let now = Utc::now();
    let model = ModelConfigRecord {
        id: Uuid::new_v4().to_string(),
        name,
        display_name,
        provider: req
            .provider
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "OLLAMA".into()),
        endpoint: req.endpoint.filter(|e| !e.is_empty()),
        api_key: req.api_key.filter(|k| !k.is_empty()),
        is_active: req.is_active.unwrap_or(true),
        is_default,
        temperature: req.temperature.unwrap_or(0.7),
        max_tokens: req.max_tokens.unwrap_or(4096),
        system_prompt: req.system_prompt.filter(|p| !p.is_empty()),
        created_at: now,
        updated_at: now,
    };
    state.store.create_model_config(model.clone()).await?;
    info!(model = %model.name, default = model.is_default, "model config created");
    Ok(Json(model.to_admin_response()))
}

#[utoipa::path(
    get,
    path = "/api/admin/models/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Model config id")),
    responses(
        (status = 200, description = "The model config", body = AdminModelResponse),
        (status = 404, description = "No such config")
    )
)]
async fn get_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AdminModelResponse>, ServerError> {
    let model = load_model(&state, &id).await?;
    Ok(Json(model.to_admin_response()))
}

/// Partial update.  Setting `isDefault: true` demotes the current default.
#[utoipa::path(
    patch,
    path = "/api/admin/models/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Model config id")),
    request_body = UpdateModelRequest,
    responses(
        (status = 200, description = "Updated config", body = AdminModelResponse),
        (status = 404, description = "No such config")
    )
)]
async fn update_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateModelRequest>,
) -> Result<Json<AdminModelResponse>, ServerError> {
    let mut model = load_model(&state, &id).await?;

    if req.is_default == Some(true) {
        state.store.clear_default_model_flags().await?;
    }
    if let Some(name) = req.name {
        model.name = name;
    }
    if let Some(display_name) = req.display_name {
        model.display_name = display_name;
    }
    if let Some(provider) = req.provider {
        model.provider = provider;
    }
    if let Some(endpoint) = req.endpoint {
        model.endpoint = endpoint;
    }
    if let Some(api_key) = req.api_key {
        model.api_key = api_key;
    }
    if let Some(active) = req.is_active {
        model.is_active = active;
    }
    if let Some(default) = req.is_default {
        model.is_default = default;
    }
    if let Some(temperature) = req.temperature {
        model.temperature = temperature;
    }
    if let Some(max_tokens) = req.max_tokens {
        model.max_tokens = max_tokens;
    }
    if let Some(system_prompt) = req.system_prompt {
        model.system_prompt = system_prompt;
    }
    model.updated_at = Utc::now();
    state.store.update_model_config(&model).await?;
    Ok(Json(model.to_admin_response()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/models/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Model config id")),
    responses(
        (status = 200, description = "Config deleted", body = Value),
        (status = 404, description = "No such config")
    )
)]
async fn delete_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if state.store.delete_model_config(&id).await? == 0 {
        return Err(ServerError::NotFound("Model not found".into()));
    }
    Ok(Json(json!({"success": true})))
}

async fn load_model(state: &AppState, id: &str) -> Result<ModelConfigRecord, ServerError> {
    state
        .store
        .get_model_config(id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Model not found".into()))
}

// ── Tests ───────────────────────────────────────────────────────────────────
