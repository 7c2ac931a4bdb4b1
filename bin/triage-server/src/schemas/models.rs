use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::ModelConfigRecord;

/// One configured model as shown in the chat model picker.  Credentials and
/// admin-only flags stay out of this shape.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomModelResponse {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub provider: String,
    pub endpoint: Option<String>,
    pub is_default: bool,
    pub temperature: f64,
    pub max_tokens: i64,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredModelsResponse {
    pub custom_models: Vec<CustomModelResponse>,
    /// Raw model descriptors from the local Ollama daemon, passed through.
    #[schema(value_type = Vec<Object>)]
    pub ollama_models: Vec<serde_json::Value>,
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DefaultModelResponse {
    pub default_model: String,
}

impl ModelConfigRecord {
    pub fn to_picker_response(&self) -> CustomModelResponse {
        CustomModelResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            provider: self.provider.clone(),
            endpoint: self.endpoint.clone(),
            is_default: self.is_default,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system_prompt: self.system_prompt.clone(),
        }
    }
}
