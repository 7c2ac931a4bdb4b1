//! Records for the admin-managed model and RAG configuration tables.
//!
//! These tables are wide; rows are decoded with `sqlx::FromRow` (column
//! names match field names) rather than hand-mapped tuples.

use chrono::{DateTime, Utc};

/// A single row in the `model_configs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ModelConfigRecord {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub provider: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub temperature: f64,
    pub max_tokens: i64,
    pub system_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single row in the `embedding_configs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmbeddingConfigRecord {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub provider: String,
    pub model_name: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub dimension: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single row in the `vector_db_configs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VectorDbConfigRecord {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub kind: String,
    pub connection_url: String,
    pub api_key: Option<String>,
    pub collection_name: String,
    /// Opaque JSON blob of store-specific settings.
    pub settings: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single row in the `chunk_configs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChunkConfigRecord {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub strategy: String,
    pub chunk_size: i64,
    pub chunk_overlap: i64,
    /// JSON-encoded separator list, `None` for the strategy default.
    pub separators: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single row in the `parser_configs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParserConfigRecord {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub kind: String,
    pub settings: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single row in the `reranker_configs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RerankerConfigRecord {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub kind: String,
    pub model_name: Option<String>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub top_k: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single row in the `rag_pipelines` table, wiring the other five config
/// kinds together.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RagPipelineRecord {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub embedding_id: Option<String>,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
