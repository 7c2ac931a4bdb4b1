//! RAG configuration: the five building-block config kinds (embeddings,
//! vector stores, chunking, parsers, rerankers) and the pipelines that wire
//! them together.
//!
//! Creates fill in per-kind defaults so the dashboard can submit a bare
//! name/display-name pair; pipeline reads resolve the referenced configs
//! inline.  Like model configs, at most one pipeline is the default.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::{
    ChunkConfigRecord, EmbeddingConfigRecord, ParserConfigRecord, RagPipelineRecord, RagStore,
    RerankerConfigRecord, VectorDbConfigRecord,
};
use crate::error::ServerError;
use crate::schemas::admin::rag::{
    AdminPipelineResponse, ChunkResponse, CreateChunkRequest, CreateEmbeddingRequest,
    CreateParserRequest, CreatePipelineRequest, CreateRerankerRequest, CreateVectorDbRequest,
    EmbeddingResponse, ParserResponse, PipelineJoins, RerankerResponse, UpdateChunkRequest,
    UpdateEmbeddingRequest, UpdateParserRequest, UpdatePipelineRequest, UpdateRerankerRequest,
    UpdateVectorDbRequest, VectorDbResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_embeddings,
        create_embedding,
        update_embedding,
        delete_embedding,
        list_vector_dbs,
        create_vector_db,
        update_vector_db,
        delete_vector_db,
        list_chunks,
        create_chunk,
        update_chunk,
        delete_chunk,
        list_parsers,
        create_parser,
        update_parser,
        delete_parser,
        list_rerankers,
        create_reranker,
        update_reranker,
        delete_reranker,
        list_pipelines,
        create_pipeline,
        get_pipeline,
        update_pipeline,
        delete_pipeline
    ),
    components(schemas(
        EmbeddingResponse,
        CreateEmbeddingRequest,
        UpdateEmbeddingRequest,
        VectorDbResponse,
        CreateVectorDbRequest,
        UpdateVectorDbRequest,
        ChunkResponse,
        CreateChunkRequest,
        UpdateChunkRequest,
        ParserResponse,
        CreateParserRequest,
        UpdateParserRequest,
        RerankerResponse,
        CreateRerankerRequest,
        UpdateRerankerRequest,
        AdminPipelineResponse,
        CreatePipelineRequest,
        UpdatePipelineRequest
    ))
)]
pub struct RagApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/rag/embeddings",
            get(list_embeddings).post(create_embedding),
        )
        .route(
            "/rag/embeddings/{id}",
            patch(update_embedding).delete(delete_embedding),
        )
        .route("/rag/vectordb", get(list_vector_dbs).post(create_vector_db))
        .route(
            "/rag/vectordb/{id}",
            patch(update_vector_db).delete(delete_vector_db),
        )
        .route("/rag/chunks", get(list_chunks).post(create_chunk))
        .route("/rag/chunks/{id}", patch(update_chunk).delete(delete_chunk))
        .route("/rag/parsers", get(list_parsers).post(create_parser))
        .route(
            "/rag/parsers/{id}",
            patch(update_parser).delete(delete_parser),
        )
        .route("/rag/rerankers", get(list_rerankers).post(create_reranker))
        .route(
            "/rag/rerankers/{id}",
            patch(update_reranker).delete(delete_reranker),
        )
        .route("/rag/pipelines", get(list_pipelines).post(create_pipeline))
        .route(
            "/rag/pipelines/{id}",
            get(get_pipeline).patch(update_pipeline).delete(delete_pipeline),
        )
}

/// Both names, non-empty, or a 400.
fn require_names(
    name: Option<String>,
    display_name: Option<String>,
) -> Result<(String, String), ServerError> {
    let name = name.filter(|n| !n.is_empty());
    let display_name = display_name.filter(|n| !n.is_empty());
    match (name, display_name) {
        (Some(n), Some(d)) => Ok((n, d)),
        _ => Err(ServerError::BadRequest(
            "Name and display name are required".into(),
        )),
    }
}

// ── Embeddings ──────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/admin/rag/embeddings",
    tag = "admin",
    responses((status = 200, description = "All embedding configs", body = Vec<EmbeddingResponse>))
)]
async fn list_embeddings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EmbeddingResponse>>, ServerError> {
    let configs = state.store.list_embedding_configs().await?;
    Ok(Json(configs.iter().map(|c| c.to_response()).collect()))
}

#[utoipa::path(
    post,
    path = "/api/admin/rag/embeddings",
    tag = "admin",
    request_body = CreateEmbeddingRequest,
    responses(
        (status = 200, description = "Embedding config created", body = EmbeddingResponse),
        (status = 400, description = "Missing name or display name")
    )
)]
async fn create_embedding(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEmbeddingRequest>,
) -> Result<Json<EmbeddingResponse>, ServerError> {
    let (name, display_name) = require_names(req.name, req.display_name)?;
    let now = Utc::now();
    let config = EmbeddingConfigRecord {
        id: Uuid::new_v4().to_string(),
        name,
        display_name,
        provider: req
            .provider
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "OLLAMA".into()),
        model_name: req
            .model_name
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "nomic-embed-text".into()),
        endpoint: req.endpoint.filter(|e| !e.is_empty()),
        api_key: req.api_key.filter(|k| !k.is_empty()),
        dimension: req.dimension.unwrap_or(768),
        is_active: req.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    state.store.create_embedding_config(config.clone()).await?;
    Ok(Json(config.to_response()))
}

#[utoipa::path(
    patch,
    path = "/api/admin/rag/embeddings/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Embedding config id")),
    request_body = UpdateEmbeddingRequest,
    responses(
        (status = 200, description = "Updated config", body = EmbeddingResponse),
        (status = 404, description = "No such config")
    )
)]
async fn update_embedding(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEmbeddingRequest>,
) -> Result<Json<EmbeddingResponse>, ServerError> {
    let mut config = state
        .store
        .get_embedding_config(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Embedding not found".into()))?;

    if let Some(name) = req.name {
        config.name = name;
    }
    if let Some(display_name) = req.display_name {
        config.display_name = display_name;
    }
    if let Some(provider) = req.provider {
        config.provider = provider;
    }
    if let Some(model_name) = req.model_name {
        config.model_name = model_name;
    }
    if let Some(endpoint) = req.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(api_key) = req.api_key {
        config.api_key = api_key;
    }
    if let Some(dimension) = req.dimension {
        config.dimension = dimension;
    }
    if let Some(active) = req.is_active {
        config.is_active = active;
    }
    config.updated_at = Utc::now();
    state.store.update_embedding_config(&config).await?;
    Ok(Json(config.to_response()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/rag/embeddings/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Embedding config id")),
    responses(
        (status = 200, description = "Config deleted", body = Value),
        (status = 404, description = "No such config")
    )
)]
async fn delete_embedding(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if state.store.delete_embedding_config(&id).await? == 0 {
        return Err(ServerError::NotFound("Embedding not found".into()));
    }
    Ok(Json(json!({"success": true})))
}

// ── Vector stores ───────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/admin/rag/vectordb",
    tag = "admin",
    responses((status = 200, description = "All vector-store configs", body = Vec<VectorDbResponse>))
)]
async fn list_vector_dbs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VectorDbResponse>>, ServerError> {
    let configs = state.store.list_vector_db_configs().await?;
    Ok(Json(configs.iter().map(|c| c.to_response()).collect()))
}

#[utoipa::path(
    post,
    path = "/api/admin/rag/vectordb",
    tag = "admin",
    request_body = CreateVectorDbRequest,
    responses(
        (status = 200, description = "Vector-store config created", body = VectorDbResponse),
        (status = 400, description = "Missing name or display name")
    )
)]
async fn create_vector_db(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateVectorDbRequest>,
) -> Result<Json<VectorDbResponse>, ServerError> {
    let (name, display_name) = require_names(req.name, req.display_name)?;
    let now = Utc::now();
    let config = VectorDbConfigRecord {
        id: Uuid::new_v4().to_string(),
        name,
        display_name,
        kind: req
            .kind
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| "CHROMA".into()),
        connection_url: req.connection_url.unwrap_or_default(),
        api_key: req.api_key,
        collection_name: req
            .collection_name
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "default".into()),
        settings: req.settings,
        is_active: req.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    state.store.create_vector_db_config(config.clone()).await?;
    Ok(Json(config.to_response()))
}

#[utoipa::path(
    patch,
    path = "/api/admin/rag/vectordb/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Vector-store config id")),
    request_body = UpdateVectorDbRequest,
    responses(
        (status = 200, description = "Updated config", body = VectorDbResponse),
        (status = 404, description = "No such config")
    )
)]
async fn update_vector_db(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateVectorDbRequest>,
) -> Result<Json<VectorDbResponse>, ServerError> {
    let mut config = state
        .store
        .get_vector_db_config(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound("VectorDB not found".into()))?;

    if let Some(name) = req.name {
        config.name = name;
    }
    if let Some(display_name) = req.display_name {
        config.display_name = display_name;
    }
    if let Some(kind) = req.kind {
        config.kind = kind;
    }
    if let Some(connection_url) = req.connection_url {
        config.connection_url = connection_url;
    }
    if let Some(api_key) = req.api_key {
        config.api_key = api_key;
    }
    if let Some(collection_name) = req.collection_name {
        config.collection_name = collection_name;
    }
    if let Some(settings) = req.settings {
        config.settings = settings;
    }
    if let Some(active) = req.is_active {
        config.is_active = active;
    }
    config.updated_at = Utc::now();
    state.store.update_vector_db_config(&config).await?;
    Ok(Json(config.to_response()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/rag/vectordb/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Vector-store config id")),
    responses(
        (status = 200, description = "Config deleted", body = Value),
        (status = 404, description = "No such config")
    )
)]
async fn delete_vector_db(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if state.store.delete_vector_db_config(&id).await? == 0 {
        return Err(ServerError::NotFound("VectorDB not found".into()));
    }
    Ok(Json(json!({"success": true})))
}

// ── Chunking ────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/admin/rag/chunks",
    tag = "admin",
    responses((status = 200, description = "All chunking configs", body = Vec<ChunkResponse>))
)]
async fn list_chunks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChunkResponse>>, ServerError> {
    let configs = state.store.list_chunk_configs().await?;
    Ok(Json(configs.iter().map(|c| c.to_response()).collect()))
}

#[utoipa::path(
    post,
    path = "/api/admin/rag/chunks",
    tag = "admin",
    request_body = CreateChunkRequest,
    responses(
        (status = 200, description = "Chunking config created", body = ChunkResponse),
        (status = 400, description = "Missing name or display name")
    )
)]
async fn create_chunk(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateChunkRequest>,
) -> Result<Json<ChunkResponse>, ServerError> {
    let (name, display_name) = require_names(req.name, req.display_name)?;
    let now = Utc::now();
    let config = ChunkConfigRecord {
        id: Uuid::new_v4().to_string(),
        name,
        display_name,
        strategy: req
            .strategy
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "RECURSIVE".into()),
        chunk_size: req.chunk_size.unwrap_or(1000),
        chunk_overlap: req.chunk_overlap.unwrap_or(200),
        separators: req.separators,
        is_active: req.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    state.store.create_chunk_config(config.clone()).await?;
    Ok(Json(config.to_response()))
}

#[utoipa::path(
    patch,
    path = "/api/admin/rag/chunks/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Chunking config id")),
    request_body = UpdateChunkRequest,
    responses(
        (status = 200, description = "Updated config", body = ChunkResponse),
        (status = 404, description = "No such config")
    )
)]
async fn update_chunk(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateChunkRequest>,
) -> Result<Json<ChunkResponse>, ServerError> {
    let mut config = state
        .store
        .get_chunk_config(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Chunk not found".into()))?;

    if let Some(name) = req.name {
        config.name = name;
    }
    if let Some(display_name) = req.display_name {
        config.display_name = display_name;
    }
    if let Some(strategy) = req.strategy {
        config.strategy = strategy;
    }
    if let Some(chunk_size) = req.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(chunk_overlap) = req.chunk_overlap {
        config.chunk_overlap = chunk_overlap;
    }
    if let Some(separators) = req.separators {
        config.separators = separators;
    }
    if let Some(active) = req.is_active {
        config.is_active = active;
    }
    config.updated_at = Utc::now();
    state.store.update_chunk_config(&config).await?;
    Ok(Json(config.to_response()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/rag/chunks/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Chunking config id")),
    responses(
        (status = 200, description = "Config deleted", body = Value),
        (status = 404, description = "No such config")
    )
)]
async fn delete_chunk(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if state.store.delete_chunk_config(&id).await? == 0 {
        return Err(ServerError::NotFound("Chunk not found".into()));
    }
    Ok(Json(json!({"success": true})))
}

// ── Parsers ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/admin/rag/parsers",
    tag = "admin",
    responses((status = 200, description = "All parser configs", body = Vec<ParserResponse>))
)]
async fn list_parsers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ParserResponse>>, ServerError> {
    let configs = state.store.list_parser_configs().await?;
    Ok(Json(configs.iter().map(|c| c.to_response()).collect()))
}

#[utoipa::path(
    post,
    path = "/api/admin/rag/parsers",
    tag = "admin",
    request_body = CreateParserRequest,
    responses(
        (status = 200, description = "Parser config created", body = ParserResponse),
        (status = 400, description = "Missing name or display name")
    )
)]
async fn create_parser(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateParserRequest>,
) -> Result<Json<ParserResponse>, ServerError> {
    let (name, display_name) = require_names(req.name, req.display_name)?;
    let now = Utc::now();
    let config = ParserConfigRecord {
        id: Uuid::new_v4().to_string(),
        name,
        display_name,
        kind: req
            .kind
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| "DEFAULT".into()),
        settings: req.settings,
        is_active: req.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    state.store.create_parser_config(config.clone()).await?;
    Ok(Json(config.to_response()))
}

#[utoipa::path(
    patch,
    path = "/api/admin/rag/parsers/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Parser config id")),
    request_body = UpdateParserRequest,
    responses(
        (status = 200, description = "Updated config", body = ParserResponse),
        (status = 404, description = "No such config")
    )
)]
async fn update_parser(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateParserRequest>,
) -> Result<Json<ParserResponse>, ServerError> {
    let mut config = state
        .store
        .get_parser_config(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Parser not found".into()))?;

    if let Some(name) = req.name {
        config.name = name;
    }
    if let Some(display_name) = req.display_name {
        config.display_name = display_name;
    }
    if let Some(kind) = req.kind {
        config.kind = kind;
    }
    if let Some(settings) = req.settings {
        config.settings = settings;
    }
    if let Some(active) = req.is_active {
        config.is_active = active;
    }
    config.updated_at = Utc::now();
    state.store.update_parser_config(&config).await?;
    Ok(Json(config.to_response()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/rag/parsers/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Parser config id")),
    responses(
        (status = 200, description = "Config deleted", body = Value),
        (status = 404, description = "No such config")
    )
)]
async fn delete_parser(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if state.store.delete_parser_config(&id).await? == 0 {
        return Err(ServerError::NotFound("Parser not found".into()));
    }
    Ok(Json(json!({"success": true})))
}

// ── Rerankers ───────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/admin/rag/rerankers",
    tag = "admin",
    responses((status = 200, description = "All reranker configs", body = Vec<RerankerResponse>))
)]
async fn list_rerankers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RerankerResponse>>, ServerError> {
    let configs = state.store.list_reranker_configs().await?;
    Ok(Json(configs.iter().map(|c| c.to_response()).collect()))
}

#[utoipa::path(
    post,
    path = "/api/admin/rag/rerankers",
    tag = "admin",
    request_body = CreateRerankerRequest,
    responses(
        (status = 200, description = "Reranker config created", body = RerankerResponse),
        (status = 400, description = "Missing name or display name")
    )
)]
async fn create_reranker(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRerankerRequest>,
) -> Result<Json<RerankerResponse>, ServerError> {
    let (name, display_name) = require_names(req.name, req.display_name)?;
    let now = Utc::now();
    let config = RerankerConfigRecord {
        id: Uuid::new_v4().to_string(),
        name,
        display_name,
        kind: req
            .kind
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| "NONE".into()),
        model_name: req.model_name,
        endpoint: req.endpoint,
        api_key: req.api_key,
        top_k: req.top_k.unwrap_or(5),
        is_active: req.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    state.store.create_reranker_config(config.clone()).await?;
    Ok(Json(config.to_response()))
}

#[utoipa::path(
    patch,
    path = "/api/admin/rag/rerankers/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Reranker config id")),
    request_body = UpdateRerankerRequest,
    responses(
        (status = 200, description = "Updated config", body = RerankerResponse),
        (status = 404, description = "No such config")
    )
)]
async fn update_reranker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRerankerRequest>,
) -> Result<Json<RerankerResponse>, ServerError> {
    let mut config = state
        .store
        .get_reranker_config(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Reranker not found".into()))?;

    if let Some(name) = req.name {
        config.name = name;
    }
    if let Some(display_name) = req.display_name {
        config.display_name = display_name;
    }
    if let Some(kind) = req.kind {
        config.kind = kind;
    }
    if let Some(model_name) = req.model_name {
        config.model_name = model_name;
    }
    if let Some(endpoint) = req.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(api_key) = req.api_key {
        config.api_key = api_key;
    }
    if let Some(top_k) = req.top_k {
        config.top_k = top_k;
    }
    if let Some(active) = req.is_active {
        config.is_active = active;
    }
    config.updated_at = Utc::now();
    state.store.update_reranker_config(&config).await?;
    Ok(Json(config.to_response()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/rag/rerankers/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Reranker config id")),
    responses(
        (status = 200, description = "Config deleted", body = Value),
        (status = 404, description = "No such config")
    )
)]
async fn delete_reranker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if state.store.delete_reranker_config(&id).await? == 0 {
        return Err(ServerError::NotFound("Reranker not found".into()));
    }
    Ok(Json(json!({"success": true})))
}

// ── Pipelines ───────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/admin/rag/pipelines",
    tag = "admin",
    responses((status = 200, description = "All pipelines, default first", body = Vec<AdminPipelineResponse>))
)]
async fn list_pipelines(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminPipelineResponse>>, ServerError> {
    let pipelines = state.store.list_rag_pipelines().await?;
    let mut out = Vec::with_capacity(pipelines.len());
    for pipeline in &pipelines {
        let joins = load_joins(&state, pipeline).await?;
        out.push(pipeline.to_response(joins));
    }
    Ok(Json(out))
}

/// Wire configs into a pipeline.  An embedding, a vector store and a chunk
/// config are mandatory; parser and reranker are optional stages.
#[utoipa::path(
    post,
    path = "/api/admin/rag/pipelines",
    tag = "admin",
    request_body = CreatePipelineRequest,
    responses(
        (status = 200, description = "Pipeline created", body = AdminPipelineResponse),
        (status = 400, description = "Missing required fields")
    )
)]
async fn create_pipeline(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePipelineRequest>,
) -> Result<Json<AdminPipelineResponse>, ServerError> {
    let name = req.name.filter(|v| !v.is_empty());
    let display_name = req.display_name.filter(|v| !v.is_empty());
    let embedding_id = req.embedding_id.filter(|v| !v.is_empty());
    let vector_db_id = req.vector_db_id.filter(|v| !v.is_empty());
    let chunk_id = req.chunk_id.filter(|v| !v.is_empty());
    let (Some(name), Some(display_name), Some(embedding_id), Some(vector_db_id), Some(chunk_id)) =
        (name, display_name, embedding_id, vector_db_id, chunk_id)
    else {
        return Err(ServerError::BadRequest("Required fields missing".into()));
    };

    let is_default = req.is_default.unwrap_or(false);
    if is_default {
        state.store.clear_default_pipeline_flags().await?;
    }

    let now = Utc::now();
    let pipeline = RagPipelineRecord {
        id: Uuid::new_v4().to_string(),
        name,
        display_name,
        description: req.description,
        embedding_id: Some(embedding_id),
        vector_db_id: Some(vector_db_id),
        chunk_id,
        parser_id: req.parser_id,
        reranker_id: req.reranker_id,
        model_config_id: req.model_config_id,
        top_k: req.top_k.unwrap_or(5),
        score_threshold: req.score_threshold.unwrap_or(0.7),
        system_prompt: req.system_prompt,
        context_template: req.context_template,
        is_active: req.is_active.unwrap_or(true),
        is_default,
        created_at: now,
        updated_at: now,
    };
    state.store.create_rag_pipeline(pipeline.clone()).await?;
    info!(pipeline = %pipeline.name, default = pipeline.is_default, "pipeline created");

    let joins = load_joins(&state, &pipeline).await?;
    Ok(Json(pipeline.to_response(joins)))
}

#[utoipa::path(
    get,
    path = "/api/admin/rag/pipelines/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Pipeline id")),
    responses(
        (status = 200, description = "The pipeline", body = AdminPipelineResponse),
        (status = 404, description = "No such pipeline")
    )
)]
async fn get_pipeline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AdminPipelineResponse>, ServerError> {
    let pipeline = load_pipeline(&state, &id).await?;
    let joins = load_joins(&state, &pipeline).await?;
    Ok(Json(pipeline.to_response(joins)))
}

/// Partial update.  Setting `isDefault: true` demotes the current default.
#[utoipa::path(
    patch,
    path = "/api/admin/rag/pipelines/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Pipeline id")),
    request_body = UpdatePipelineRequest,
    responses(
        (status = 200, description = "Updated pipeline", body = AdminPipelineResponse),
        (status = 404, description = "No such pipeline")
    )
)]
async fn update_pipeline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePipelineRequest>,
) -> Result<Json<AdminPipelineResponse>, ServerError> {
    let mut pipeline = load_pipeline(&state, &id).await?;

    if req.is_default == Some(true) {
        state.store.clear_default_pipeline_flags().await?;
    }
    if let Some(name) = req.name {
        pipeline.name = name;
    }
    if let Some(display_name) = req.display_name {
        pipeline.display_name = display_name;
    }
    if let Some(description) = req.description {
        pipeline.description = description;
    }
    if let Some(embedding_id) = req.embedding_id {
        pipeline.embedding_id = Some(embedding_id);
    }
    if let Some(vector_db_id) = req.vector_db_id {
        pipeline.vector_db_id = Some(vector_db_id);
    }
    if let Some(chunk_id) = req.chunk_id {
        pipeline.chunk_id = chunk_id;
    }
    if let Some(parser_id) = req.parser_id {
        pipeline.parser_id = parser_id;
    }
    if let Some(reranker_id) = req.reranker_id {
        pipeline.reranker_id = reranker_id;
    }
    if let Some(model_config_id) = req.model_config_id {
        pipeline.model_config_id = model_config_id;
    }
    if let Some(top_k) = req.top_k {
        pipeline.top_k = top_k;
    }
    if let Some(score_threshold) = req.score_threshold {
        pipeline.score_threshold = score_threshold;
    }
    if let Some(system_prompt) = req.system_prompt {
        pipeline.system_prompt = system_prompt;
    }
    if let Some(context_template) = req.context_template {
        pipeline.context_template = context_template;
    }
    if let Some(active) = req.is_active {
        pipeline.is_active = active;
    }
    if let Some(default) = req.is_default {
        pipeline.is_default = default;
    }
    pipeline.updated_at = Utc::now();
    state.store.update_rag_pipeline(&pipeline).await?;

    let joins = load_joins(&state, &pipeline).await?;
    Ok(Json(pipeline.to_response(joins)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/rag/pipelines/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Pipeline id")),
    responses(
        (status = 200, description = "Pipeline deleted", body = Value),
        (status = 404, description = "No such pipeline")
    )
)]
async fn delete_pipeline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if state.store.delete_rag_pipeline(&id).await? == 0 {
        return Err(ServerError::NotFound("Pipeline not found".into()));
    }
    Ok(Json(json!({"success": true})))
}

async fn load_pipeline(state: &AppState, id: &str) -> Result<RagPipelineRecord, ServerError> {
    state
        .store
        .get_rag_pipeline(id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Pipeline not found".into()))
}

/// Resolve the configs a pipeline row references.  Dangling ids resolve to
/// `None` rather than failing the read.
async fn load_joins(
    state: &AppState,
    pipeline: &RagPipelineRecord,
) -> Result<PipelineJoins, ServerError> {
    let mut joins = PipelineJoins::default();
    if let Some(id) = &pipeline.embedding_id {
        joins.embedding = state.store.get_embedding_config(id).await?;
    }
    if let Some(id) = &pipeline.vector_db_id {
        joins.vector_db = state.store.get_vector_db_config(id).await?;
    }
    joins.chunk = state.store.get_chunk_config(&pipeline.chunk_id).await?;
    if let Some(id) = &pipeline.parser_id {
        joins.parser = state.store.get_parser_config(id).await?;
    }
    if let Some(id) = &pipeline.reranker_id {
        joins.reranker = state.store.get_reranker_config(id).await?;
    }
    Ok(joins)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::routes;
    use crate::test_support::{
        bearer, delete, get, json_body, patch_json, post_json, seed_user, state,
    };

    async fn create(
        state: &std::sync::Arc<crate::state::AppState>,
        token: &str,
        path: &str,
        body: Value,
    ) -> Value {
        let response = routes::build(state.clone())
            .oneshot(post_json(path, Some(token), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "POST {path}");
        json_body(response).await
    }

    /// One config of each mandatory kind, for pipeline tests.
    async fn seed_blocks(
        state: &std::sync::Arc<crate::state::AppState>,
        token: &str,
    ) -> (String, String, String) {
        let embedding = create(
            state,
            token,
            "/api/admin/rag/embeddings",
            json!({"name": "nomic", "displayName": "Nomic"}),
        )
        .await;
        let vector_db = create(
            state,
            token,
            "/api/admin/rag/vectordb",
            json!({"name": "chroma-local", "displayName": "Chroma"}),
        )
        .await;
        let chunk = create(
            state,
            token,
            "/api/admin/rag/chunks",
            json!({"name": "recursive-1k", "displayName": "Recursive 1k"}),
        )
        .await;
        (
            embedding["id"].as_str().unwrap().to_string(),
            vector_db["id"].as_str().unwrap().to_string(),
            chunk["id"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn each_kind_fills_in_its_documented_defaults() {
        let state = state().await;
        let admin = seed_user(&state, "root@acme.io", "pw", "ADMIN").await;
        let token = bearer(&state, &admin);

        let embedding = create(
            &state,
            &token,
            "/api/admin/rag/embeddings",
            json!({"name": "nomic", "displayName": "Nomic"}),
        )
        .await;
        assert_eq!(embedding["provider"], "OLLAMA");
        assert_eq!(embedding["modelName"], "nomic-embed-text");
        assert_eq!(embedding["dimension"], 768);
        assert_eq!(embedding["isActive"], true);

        let vector_db = create(
            &state,
            &token,
            "/api/admin/rag/vectordb",
            json!({"name": "chroma-local", "displayName": "Chroma"}),
        )
        .await;
        assert_eq!(vector_db["type"], "CHROMA");
        assert_eq!(vector_db["collectionName"], "default");

        let chunk = create(
            &state,
            &token,
            "/api/admin/rag/chunks",
            json!({"name": "recursive-1k", "displayName": "Recursive 1k"}),
        )
        .await;
        assert_eq!(chunk["strategy"], "RECURSIVE");
        assert_eq!(chunk["chunkSize"], 1000);
        assert_eq!(chunk["chunkOverlap"], 200);

        let parser = create(
            &state,
            &token,
            "/api/admin/rag/parsers",
            json!({"name": "plain", "displayName": "Plain"}),
        )
        .await;
        assert_eq!(parser["type"], "DEFAULT");

        let reranker = create(
            &state,
            &token,
            "/api/admin/rag/rerankers",
            json!({"name": "none", "displayName": "No rerank"}),
        )
        .await;
        assert_eq!(reranker["type"], "NONE");
        assert_eq!(reranker["topK"], 5);

        let response = routes::build(state.clone())
            .oneshot(post_json(
                "/api/admin/rag/parsers",
                Some(&token),
                &json!({"name": "nameless"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "Name and display name are required"
        );
    }

    #[tokio::test]
    async fn pipelines_require_their_building_blocks() {
        let state = state().await;
        let admin = seed_user(&state, "root@acme.io", "pw", "ADMIN").await;
        let token = bearer(&state, &admin);
        let (embedding_id, vector_db_id, chunk_id) = seed_blocks(&state, &token).await;

        let response = routes::build(state.clone())
            .oneshot(post_json(
                "/api/admin/rag/pipelines",
                Some(&token),
                &json!({"name": "main", "displayName": "Main", "embeddingId": embedding_id}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Required fields missing");

        let pipeline = create(
            &state,
            &token,
            "/api/admin/rag/pipelines",
            json!({
                "name": "main",
                "displayName": "Main",
                "embeddingId": embedding_id,
                "vectorDBId": vector_db_id,
                "chunkId": chunk_id,
                "isDefault": true,
            }),
        )
        .await;
        assert_eq!(pipeline["topK"], 5);
        assert_eq!(pipeline["scoreThreshold"], 0.7);
        assert_eq!(pipeline["embedding"]["name"], "nomic");
        assert_eq!(pipeline["vectorDB"]["name"], "chroma-local");
        assert_eq!(pipeline["chunk"]["name"], "recursive-1k");
        assert!(pipeline["parser"].is_null());
    }

    #[tokio::test]
    async fn the_default_flag_moves_between_pipelines() {
        let state = state().await;
        let admin = seed_user(&state, "root@acme.io", "pw", "ADMIN").await;
        let token = bearer(&state, &admin);
        let (embedding_id, vector_db_id, chunk_id) = seed_blocks(&state, &token).await;
        let base = json!({
            "embeddingId": embedding_id,
            "vectorDBId": vector_db_id,
            "chunkId": chunk_id,
        });

        let mut first = base.clone();
        first["name"] = json!("first");
        first["displayName"] = json!("First");
        first["isDefault"] = json!(true);
        let first = create(&state, &token, "/api/admin/rag/pipelines", first).await;

        let mut second = base.clone();
        second["name"] = json!("second");
        second["displayName"] = json!("Second");
        let second = create(&state, &token, "/api/admin/rag/pipelines", second).await;

        let response = routes::build(state.clone())
            .oneshot(patch_json(
                &format!("/api/admin/rag/pipelines/{}", second["id"].as_str().unwrap()),
                Some(&token),
                &json!({"isDefault": true}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = routes::build(state.clone())
            .oneshot(get(
                &format!("/api/admin/rag/pipelines/{}", first["id"].as_str().unwrap()),
                Some(&token),
            ))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["isDefault"], false);

        let response = routes::build(state.clone())
            .oneshot(get("/api/admin/rag/pipelines", Some(&token)))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body[0]["name"], "second");
        assert_eq!(body[0]["isDefault"], true);
    }

    #[tokio::test]
    async fn deletes_answer_once_then_not_found() {
        let state = state().await;
        let admin = seed_user(&state, "root@acme.io", "pw", "ADMIN").await;
        let token = bearer(&state, &admin);
        let reranker = create(
            &state,
            &token,
            "/api/admin/rag/rerankers",
            json!({"name": "bge", "displayName": "BGE", "type": "CROSS_ENCODER"}),
        )
        .await;
        let id = reranker["id"].as_str().unwrap();

        let response = routes::build(state.clone())
            .oneshot(delete(&format!("/api/admin/rag/rerankers/{id}"), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);

        let response = routes::build(state.clone())
            .oneshot(delete(&format!("/api/admin/rag/rerankers/{id}"), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "Reranker not found");
    }
}
