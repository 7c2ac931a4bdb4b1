//! Wire types for the five RAG building-block configs and the pipelines
//! that wire them together.
//!
//! Pipeline responses embed the referenced configs the way the dashboard
//! renders them, under their relation names (`embedding`, `vectorDB`,
//! `chunk`, `parser`, `reranker`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{
    ChunkConfigRecord, EmbeddingConfigRecord, ParserConfigRecord, RagPipelineRecord,
    RerankerConfigRecord, VectorDbConfigRecord,
};

// ── Embeddings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingResponse {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub provider: String,
    pub model_name: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub dimension: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmbeddingRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub dimension: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmbeddingRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub endpoint: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub api_key: Option<Option<String>>,
    #[serde(default)]
    pub dimension: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// ── Vector stores ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VectorDbResponse {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub connection_url: String,
    pub api_key: Option<String>,
    pub collection_name: String,
    pub settings: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVectorDbRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub connection_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub settings: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVectorDbRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub connection_url: Option<String>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub api_key: Option<Option<String>>,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub settings: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// ── Chunking ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChunkResponse {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub strategy: String,
    pub chunk_size: i64,
    pub chunk_overlap: i64,
    pub separators: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChunkRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub chunk_size: Option<i64>,
    #[serde(default)]
    pub chunk_overlap: Option<i64>,
    #[serde(default)]
    pub separators: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChunkRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub chunk_size: Option<i64>,
    #[serde(default)]
    pub chunk_overlap: Option<i64>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub separators: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// ── Parsers ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParserResponse {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub settings: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateParserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub settings: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub settings: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// ── Rerankers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RerankerResponse {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub model_name: Option<String>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub top_k: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRerankerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub top_k: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRerankerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub model_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub endpoint: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub api_key: Option<Option<String>>,
    #[serde(default)]
    pub top_k: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// ── Pipelines ─────────────────────────────────────────────────────────────────

/// Pipeline row with its referenced configs resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminPipelineResponse {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub embedding_id: Option<String>,
    #[serde(rename = "vectorDBId")]
    pub vector_db_id: Option<String>,
    pub chunk_id: String,
    pub parser_id: Option<String>,
    pub reranker_id: Option<String>,
    pub model_config_id: Option<String>,
    pub top_k: i64,
    pub score_threshold: f64,
    pub system_prompt: Option<String>,
    pub context_template: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: String,
    pub updated_at: String,
    pub embedding: Option<EmbeddingResponse>,
    #[serde(rename = "vectorDB")]
    pub vector_db: Option<VectorDbResponse>,
    pub chunk: Option<ChunkResponse>,
    pub parser: Option<ParserResponse>,
    pub reranker: Option<RerankerResponse>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePipelineRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub embedding_id: Option<String>,
    #[serde(default, rename = "vectorDBId")]
    pub vector_db_id: Option<String>,
    #[serde(default)]
    pub chunk_id: Option<String>,
    #[serde(default)]
    pub parser_id: Option<String>,
    #[serde(default)]
    pub reranker_id: Option<String>,
    #[serde(default)]
    pub model_config_id: Option<String>,
    #[serde(default)]
    pub top_k: Option<i64>,
    #[serde(default)]
    pub score_threshold: Option<f64>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub context_template: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePipelineRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub embedding_id: Option<String>,
    #[serde(default, rename = "vectorDBId")]
    pub vector_db_id: Option<String>,
    #[serde(default)]
    pub chunk_id: Option<String>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub parser_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub reranker_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub model_config_id: Option<Option<String>>,
    #[serde(default)]
    pub top_k: Option<i64>,
    #[serde(default)]
    pub score_threshold: Option<f64>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub system_prompt: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub context_template: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

// ── Record mappers ────────────────────────────────────────────────────────────

impl EmbeddingConfigRecord {
    pub fn to_response(&self) -> EmbeddingResponse {
        EmbeddingResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            provider: self.provider.clone(),
            model_name: self.model_name.clone(),
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            dimension: self.dimension,
            is_active: self.is_active,
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

impl VectorDbConfigRecord {
    pub fn to_response(&self) -> VectorDbResponse {
        VectorDbResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            kind: self.kind.clone(),
            connection_url: self.connection_url.clone(),
            api_key: self.api_key.clone(),
            collection_name: self.collection_name.clone(),
            settings: self.settings.clone(),
            is_active: self.is_active,
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

impl ChunkConfigRecord {
    pub fn to_response(&self) -> ChunkResponse {
        ChunkResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            strategy: self.strategy.clone(),
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            separators: self.separators.clone(),
            is_active: self.is_active,
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

impl ParserConfigRecord {
    pub fn to_response(&self) -> ParserResponse {
        ParserResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            kind: self.kind.clone(),
            settings: self.settings.clone(),
            is_active: self.is_active,
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

impl RerankerConfigRecord {
    pub fn to_response(&self) -> RerankerResponse {
        RerankerResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            kind: self.kind.clone(),
            model_name: self.model_name.clone(),
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            top_k: self.top_k,
            is_active: self.is_active,
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

/// The resolved configs a pipeline row points at.
#[derive(Debug, Clone, Default)]
pub struct PipelineJoins {
    pub embedding: Option<EmbeddingConfigRecord>,
    pub vector_db: Option<VectorDbConfigRecord>,
    pub chunk: Option<ChunkConfigRecord>,
    pub parser: Option<ParserConfigRecord>,
    pub reranker: Option<RerankerConfigRecord>,
}

impl RagPipelineRecord {
    pub fn to_response(&self, joins: PipelineJoins) -> AdminPipelineResponse {
        AdminPipelineResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            embedding_id: self.embedding_id.clone(),
            vector_db_id: self.vector_db_id.clone(),
            chunk_id: self.chunk_id.clone(),
            parser_id: self.parser_id.clone(),
            reranker_id: self.reranker_id.clone(),
            model_config_id: self.model_config_id.clone(),
            top_k: self.top_k,
            score_threshold: self.score_threshold,
            system_prompt: self.system_prompt.clone(),
            context_template: self.context_template.clone(),
            is_active: self.is_active,
            is_default: self.is_default,
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
            embedding: joins.embedding.as_ref().map(|e| e.to_response()),
            vector_db: joins.vector_db.as_ref().map(|v| v.to_response()),
            chunk: joins.chunk.as_ref().map(|c| c.to_response()),
            parser: joins.parser.as_ref().map(|p| p.to_response()),
            reranker: joins.reranker.as_ref().map(|r| r.to_response()),
        }
    }
}
