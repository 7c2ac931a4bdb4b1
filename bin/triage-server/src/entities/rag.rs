//! Persistence for the retrieval-pipeline configuration tables.
//!
//! Five leaf config kinds (embedding, vector store, chunking, parser,
//! reranker) plus the `rag_pipelines` table that wires them together.  All
//! rows decode via `sqlx::FromRow`; the CRUD shape is identical across kinds.

use std::future::Future;

use crate::entities::{
    ChunkConfigRecord, EmbeddingConfigRecord, ParserConfigRecord, RagPipelineRecord,
    RerankerConfigRecord, SqliteStore, VectorDbConfigRecord,
};

const EMBEDDING_COLUMNS: &str = "id, name, display_name, provider, model_name, endpoint, \
                                 api_key, dimension, is_active, created_at, updated_at";
const VECTOR_DB_COLUMNS: &str = "id, name, display_name, kind, connection_url, api_key, \
                                 collection_name, settings, is_active, created_at, updated_at";
const CHUNK_COLUMNS: &str = "id, name, display_name, strategy, chunk_size, chunk_overlap, \
                             separators, is_active, created_at, updated_at";
const PARSER_COLUMNS: &str = "id, name, display_name, kind, settings, is_active, created_at, \
                              updated_at";
const RERANKER_COLUMNS: &str = "id, name, display_name, kind, model_name, endpoint, api_key, \
                                top_k, is_active, created_at, updated_at";
const PIPELINE_COLUMNS: &str = "id, name, display_name, description, embedding_id, vector_db_id, \
                                chunk_id, parser_id, reranker_id, model_config_id, top_k, \
                                score_threshold, system_prompt, context_template, is_active, \
                                is_default, created_at, updated_at";

pub trait RagStore: Send + Sync + 'static {
    fn create_embedding_config(
        &self,
        config: EmbeddingConfigRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_embedding_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<EmbeddingConfigRecord>, sqlx::Error>> + Send;
    fn list_embedding_configs(
        &self,
    ) -> impl Future<Output = Result<Vec<EmbeddingConfigRecord>, sqlx::Error>> + Send;
    fn update_embedding_config(
        &self,
        config: &EmbeddingConfigRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_embedding_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;

    fn create_vector_db_config(
        &self,
        config: VectorDbConfigRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_vector_db_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<VectorDbConfigRecord>, sqlx::Error>> + Send;
    fn list_vector_db_configs(
        &self,
    ) -> impl Future<Output = Result<Vec<VectorDbConfigRecord>, sqlx::Error>> + Send;
    fn update_vector_db_config(
        &self,
        config: &VectorDbConfigRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_vector_db_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;

    fn create_chunk_config(
        &self,
        config: ChunkConfigRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_chunk_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<ChunkConfigRecord>, sqlx::Error>> + Send;
    fn list_chunk_configs(
        &self,
    ) -> impl Future<Output = Result<Vec<ChunkConfigRecord>, sqlx::Error>> + Send;
    fn update_chunk_config(
        &self,
        config: &ChunkConfigRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_chunk_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;

    fn create_parser_config(
        &self,
        config: ParserConfigRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_parser_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<ParserConfigRecord>, sqlx::Error>> + Send;
    fn list_parser_configs(
        &self,
    ) -> impl Future<Output = Result<Vec<ParserConfigRecord>, sqlx::Error>> + Send;
    fn update_parser_config(
        &self,
        config: &ParserConfigRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_parser_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;

    fn create_reranker_config(
        &self,
        config: RerankerConfigRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_reranker_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<RerankerConfigRecord>, sqlx::Error>> + Send;
    fn list_reranker_configs(
        &self,
    ) -> impl Future<Output = Result<Vec<RerankerConfigRecord>, sqlx::Error>> + Send;
    fn update_reranker_config(
        &self,
        config: &RerankerConfigRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_reranker_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;

    fn create_rag_pipeline(
        &self,
        pipeline: RagPipelineRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_rag_pipeline(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<RagPipelineRecord>, sqlx::Error>> + Send;
    fn list_rag_pipelines(
        &self,
    ) -> impl Future<Output = Result<Vec<RagPipelineRecord>, sqlx::Error>> + Send;
    fn update_rag_pipeline(
        &self,
        pipeline: &RagPipelineRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_rag_pipeline(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
    /// Clear `is_default` on every pipeline, ahead of electing a new one.
    fn clear_default_pipeline_flags(
        &self,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}

impl RagStore for SqliteStore {
    async fn create_embedding_config(
        &self,
        config: EmbeddingConfigRecord,
    ) -> Result<(), sqlx::Error> {
        let created_at = config.created_at.to_rfc3339();
        let updated_at = config.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO embedding_configs \
             (id, name, display_name, provider, model_name, endpoint, api_key, dimension, \
              is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&config.id)
        .bind(&config.name)
        .bind(&config.display_name)
        .bind(&config.provider)
        .bind(&config.model_name)
        .bind(&config.endpoint)
        .bind(&config.api_key)
        .bind(config.dimension)
        .bind(config.is_active)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_embedding_config(
        &self,
        id: &str,
    ) -> Result<Option<EmbeddingConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {EMBEDDING_COLUMNS} FROM embedding_configs WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_embedding_configs(&self) -> Result<Vec<EmbeddingConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {EMBEDDING_COLUMNS} FROM embedding_configs ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn update_embedding_config(
        &self,
        config: &EmbeddingConfigRecord,
    ) -> Result<(), sqlx::Error> {
        let updated_at = config.updated_at.to_rfc3339();
        sqlx::query(
            "UPDATE embedding_configs SET name = ?1, display_name = ?2, provider = ?3, \
             model_name = ?4, endpoint = ?5, api_key = ?6, dimension = ?7, is_active = ?8, \
             updated_at = ?9 WHERE id = ?10",
        )
        .bind(&config.name)
        .bind(&config.display_name)
        .bind(&config.provider)
        .bind(&config.model_name)
        .bind(&config.endpoint)
        .bind(&config.api_key)
        .bind(config.dimension)
        .bind(config.is_active)
        .bind(&updated_at)
        .bind(&config.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_embedding_config(&self, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM embedding_configs WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_vector_db_config(
        &self,
        config: VectorDbConfigRecord,
    ) -> Result<(), sqlx::Error> {
        let created_at = config.created_at.to_rfc3339();
        let updated_at = config.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO vector_db_configs \
             (id, name, display_name, kind, connection_url, api_key, collection_name, settings, \
              is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&config.id)
        .bind(&config.name)
        .bind(&config.display_name)
        .bind(&config.kind)
        .bind(&config.connection_url)
        .bind(&config.api_key)
        .bind(&config.collection_name)
        .bind(&config.settings)
        .bind(config.is_active)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_vector_db_config(
        &self,
        id: &str,
    ) -> Result<Option<VectorDbConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {VECTOR_DB_COLUMNS} FROM vector_db_configs WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_vector_db_configs(&self) -> Result<Vec<VectorDbConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {VECTOR_DB_COLUMNS} FROM vector_db_configs ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn update_vector_db_config(
        &self,
        config: &VectorDbConfigRecord,
    ) -> Result<(), sqlx::Error> {
        let updated_at = config.updated_at.to_rfc3339();
        sqlx::query(
            "UPDATE vector_db_configs SET name = ?1, display_name = ?2, kind = ?3, \
             connection_url = ?4, api_key = ?5, collection_name = ?6, settings = ?7, \
             is_active = ?8, updated_at = ?9 WHERE id = ?10",
        )
        .bind(&config.name)
        .bind(&config.display_name)
        .bind(&config.kind)
        .bind(&config.connection_url)
        .bind(&config.api_key)
        .bind(&config.collection_name)
        .bind(&config.settings)
        .bind(config.is_active)
        .bind(&updated_at)
        .bind(&config.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_vector_db_config(&self, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vector_db_configs WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_chunk_config(&self, config: ChunkConfigRecord) -> Result<(), sqlx::Error> {
        let created_at = config.created_at.to_rfc3339();
        let updated_at = config.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO chunk_configs \
             (id, name, display_name, strategy, chunk_size, chunk_overlap, separators, \
              is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&config.id)
        .bind(&config.name)
        .bind(&config.display_name)
        .bind(&config.strategy)
        .bind(config.chunk_size)
        .bind(config.chunk_overlap)
        .bind(&config.separators)
        .bind(config.is_active)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_chunk_config(&self, id: &str) -> Result<Option<ChunkConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {CHUNK_COLUMNS} FROM chunk_configs WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_chunk_configs(&self) -> Result<Vec<ChunkConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {CHUNK_COLUMNS} FROM chunk_configs ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn update_chunk_config(&self, config: &ChunkConfigRecord) -> Result<(), sqlx::Error> {
        let updated_at = config.updated_at.to_rfc3339();
        sqlx::query(
            "UPDATE chunk_configs SET name = ?1, display_name = ?2, strategy = ?3, \
             chunk_size = ?4, chunk_overlap = ?5, separators = ?6, is_active = ?7, \
             updated_at = ?8 WHERE id = ?9",
        )
        .bind(&config.name)
        .bind(&config.display_name)
        .bind(&config.strategy)
        .bind(config.chunk_size)
        .bind(config.chunk_overlap)
        .bind(&config.separators)
        .bind(config.is_active)
        .bind(&updated_at)
        .bind(&config.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_chunk_config(&self, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM chunk_configs WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_parser_config(&self, config: ParserConfigRecord) -> Result<(), sqlx::Error> {
        let created_at = config.created_at.to_rfc3339();
        let updated_at = config.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO parser_configs \
             (id, name, display_name, kind, settings, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&config.id)
        .bind(&config.name)
        .bind(&config.display_name)
        .bind(&config.kind)
        .bind(&config.settings)
        .bind(config.is_active)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_parser_config(
        &self,
        id: &str,
    ) -> Result<Option<ParserConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {PARSER_COLUMNS} FROM parser_configs WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_parser_configs(&self) -> Result<Vec<ParserConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {PARSER_COLUMNS} FROM parser_configs ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn update_parser_config(&self, config: &ParserConfigRecord) -> Result<(), sqlx::Error> {
        let updated_at = config.updated_at.to_rfc3339();
        sqlx::query(
            "UPDATE parser_configs SET name = ?1, display_name = ?2, kind = ?3, settings = ?4, \
             is_active = ?5, updated_at = ?6 WHERE id = ?7",
        )
        .bind(&config.name)
        .bind(&config.display_name)
        .bind(&config.kind)
        .bind(&config.settings)
        .bind(config.is_active)
        .bind(&updated_at)
        .bind(&config.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_parser_config(&self, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM parser_configs WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_reranker_config(
        &self,
        config: RerankerConfigRecord,
    ) -> Result<(), sqlx::Error> {
        let created_at = config.created_at.to_rfc3339();
        let updated_at = config.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO reranker_configs \
             (id, name, display_name, kind, model_name, endpoint, api_key, top_k, is_active, \
              created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&config.id)
        .bind(&config.name)
        .bind(&config.display_name)
        .bind(&config.kind)
        .bind(&config.model_name)
        .bind(&config.endpoint)
        .bind(&config.api_key)
        .bind(config.top_k)
        .bind(config.is_active)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_reranker_config(
        &self,
        id: &str,
    ) -> Result<Option<RerankerConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {RERANKER_COLUMNS} FROM reranker_configs WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_reranker_configs(&self) -> Result<Vec<RerankerConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {RERANKER_COLUMNS} FROM reranker_configs ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn update_reranker_config(
        &self,
        config: &RerankerConfigRecord,
    ) -> Result<(), sqlx::Error> {
        let updated_at = config.updated_at.to_rfc3339();
        sqlx::query(
            "UPDATE reranker_configs SET name = ?1, display_name = ?2, kind = ?3, \
             model_name = ?4, endpoint = ?5, api_key = ?6, top_k = ?7, is_active = ?8, \
             updated_at = ?9 WHERE id = ?10",
        )
        .bind(&config.name)
        .bind(&config.display_name)
        .bind(&config.kind)
        .bind(&config.model_name)
        .bind(&config.endpoint)
        .bind(&config.api_key)
        .bind(config.top_k)
        .bind(config.is_active)
        .bind(&updated_at)
        .bind(&config.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_reranker_config(&self, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reranker_configs WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_rag_pipeline(&self, pipeline: RagPipelineRecord) -> Result<(), sqlx::Error> {
        let created_at = pipeline.created_at.to_rfc3339();
        let updated_at = pipeline.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO rag_pipelines \
             (id, name, display_name, description, embedding_id, vector_db_id, chunk_id, \
              parser_id, reranker_id, model_config_id, top_k, score_threshold, system_prompt, \
              context_template, is_active, is_default, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        )
        .bind(&pipeline.id)
        .bind(&pipeline.name)
        .bind(&pipeline.display_name)
        .bind(&pipeline.description)
        .bind(&pipeline.embedding_id)
        .bind(&pipeline.vector_db_id)
        .bind(&pipeline.chunk_id)
        .bind(&pipeline.parser_id)
        .bind(&pipeline.reranker_id)
        .bind(&pipeline.model_config_id)
        .bind(pipeline.top_k)
        .bind(pipeline.score_threshold)
        .bind(&pipeline.system_prompt)
        .bind(&pipeline.context_template)
        .bind(pipeline.is_active)
        .bind(pipeline.is_default)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_rag_pipeline(&self, id: &str) -> Result<Option<RagPipelineRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {PIPELINE_COLUMNS} FROM rag_pipelines WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_rag_pipelines(&self) -> Result<Vec<RagPipelineRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {PIPELINE_COLUMNS} FROM rag_pipelines ORDER BY is_default DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn update_rag_pipeline(&self, pipeline: &RagPipelineRecord) -> Result<(), sqlx::Error> {
        let updated_at = pipeline.updated_at.to_rfc3339();
        sqlx::query(
            "UPDATE rag_pipelines SET name = ?1, display_name = ?2, description = ?3, \
             embedding_id = ?4, vector_db_id = ?5, chunk_id = ?6, parser_id = ?7, \
             reranker_id = ?8, model_config_id = ?9, top_k = ?10, score_threshold = ?11, \
             system_prompt = ?12, context_template = ?13, is_active = ?14, is_default = ?15, \
             updated_at = ?16 WHERE id = ?17",
        )
        .bind(&pipeline.name)
        .bind(&pipeline.display_name)
        .bind(&pipeline.description)
        .bind(&pipeline.embedding_id)
        .bind(&pipeline.vector_db_id)
        .bind(&pipeline.chunk_id)
        .bind(&pipeline.parser_id)
        .bind(&pipeline.reranker_id)
        .bind(&pipeline.model_config_id)
        .bind(pipeline.top_k)
        .bind(pipeline.score_threshold)
        .bind(&pipeline.system_prompt)
        .bind(&pipeline.context_template)
        .bind(pipeline.is_active)
        .bind(pipeline.is_default)
        .bind(&updated_at)
        .bind(&pipeline.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_rag_pipeline(&self, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rag_pipelines WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn clear_default_pipeline_flags(&self) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE rag_pipelines SET is_default = 0 WHERE is_default = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
