//! System settings: a flat key/value table with dotted keys.
//!
//! Reads overlay the stored rows onto a built-in default set so new keys
//! show up pre-populated; writes upsert in bulk, deriving each row's
//! category from the key prefix.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;
use utoipa::{IntoParams, OpenApi};

use crate::config::Config;
use crate::entities::ConfigStore;
use crate::error::ServerError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_settings, save_settings))]
pub struct SettingsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/settings", get(get_settings).post(save_settings))
}

#[derive(Debug, Deserialize, IntoParams)]
struct SettingsParams {
    /// Restrict the stored rows to one category, e.g. `llm`.
    category: Option<String>,
}

/// LLM settings every deployment starts from.  Stored rows overlay these,
/// so the map a client reads never has holes.
fn defaults(config: &Config) -> Vec<(String, String)> {
    vec![
        ("llm.defaultModel".into(), config.default_model.clone()),
        ("llm.temperature".into(), "0.7".into()),
        ("llm.maxTokens".into(), "4096".into()),
        (
            "llm.systemPrompt".into(),
            "You are a helpful AI assistant. Respond in the same language as the user.".into(),
        ),
        ("llm.ollamaHost".into(), config.ollama_host.clone()),
    ]
}

/// The merged settings map.
#[utoipa::path(
    get,
    path = "/api/admin/settings",
    tag = "admin",
    params(SettingsParams),
    responses(
        (status = 200, description = "Flat key/value settings map", body = Value),
        (status = 403, description = "Caller is not an admin")
    )
)]
async fn get_settings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SettingsParams>,
) -> Result<Json<BTreeMap<String, String>>, ServerError> {
    let mut map: BTreeMap<String, String> = defaults(&state.config).into_iter().collect();
    for (key, value, _) in state
        .store
        .list_settings(params.category.as_deref())
        .await?
    {
        map.insert(key, value);
    }
    Ok(Json(map))
}

/// Bulk upsert.  The body is a flat `{key: value}` map; values are
/// stringified and each key's category is its dotted prefix.
#[utoipa::path(
    post,
    path = "/api/admin/settings",
    tag = "admin",
    request_body = Value,
    responses(
        (status = 200, description = "Settings stored", body = Value),
        (status = 403, description = "Caller is not an admin")
    )
)]
async fn save_settings(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Value>, ServerError> {
    let count = body.len();
    for (key, value) in body {
        let value = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let category = key
            .split('.')
            .next()
            .filter(|p| !p.is_empty())
            .unwrap_or("general");
        state.store.upsert_setting(&key, &value, category).await?;
    }
    info!(count, "settings saved");
    Ok(Json(json!({"success": true})))
}

// ── Tests ───────────────────────────────────────────────────────────────────
