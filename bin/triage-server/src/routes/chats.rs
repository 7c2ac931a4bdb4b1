//! Chat collection CRUD and bulk transcript saves.
//!
//! Every row is scoped to the authenticated caller; a chat id that exists
//! but belongs to someone else is indistinguishable from one that does not
//! exist (`404` either way).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::auth::Claims;
use crate::entities::{ChatRecord, ChatStore, GroupStore, MessageRecord};
use crate::error::ServerError;
use crate::schemas::chats::{
    BulkMessagesRequest, BulkSaveResponse, ChatDetailResponse, ChatListResponse, ChatResponse,
    CreateChatRequest, IncomingMessage, MessageResponse, UpdateChatRequest,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_chats,
        create_chat,
        get_chat,
        update_chat,
        delete_chat,
        list_chat_messages,
        save_messages
    ),
    components(schemas(
        ChatListResponse,
        ChatResponse,
        ChatDetailResponse,
        MessageResponse,
        CreateChatRequest,
        UpdateChatRequest,
        BulkMessagesRequest,
        IncomingMessage,
        BulkSaveResponse
    ))
)]
pub struct ChatsApi;

/// Register chat CRUD routes (mounted on the authenticated `/api` router).
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chats", get(list_chats).post(create_chat))
        .route(
            "/chats/{id}",
            get(get_chat).patch(update_chat).delete(delete_chat),
        )
        .route(
            "/chats/{id}/messages",
            get(list_chat_messages).post(save_messages),
        )
}

/// List the caller's chats, most recently active first.
#[utoipa::path(
    get,
    path = "/api/chats",
    tag = "chats",
    responses(
        (status = 200, description = "Chats listed", body = ChatListResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ChatListResponse>, ServerError> {
    let chats = state
        .store
        .list_chats(&claims.sub)
        .await?
        .iter()
        .map(ChatRecord::to_response)
        .collect();
    Ok(Json(ChatListResponse { chats }))
}

/// Open a new, untitled chat.
///
/// The title stays `"New Chat"` until the first user turn is relayed through
/// `POST /api/chat`, which derives one from the prompt.
#[utoipa::path(
    post,
    path = "/api/chats",
    tag = "chats",
    request_body = CreateChatRequest,
    responses(
        (status = 201, description = "Chat created", body = ChatResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "groupId does not name a group owned by the caller")
    )
)]
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), ServerError> {
    if let Some(group_id) = &req.group_id {
        ensure_group(&state, group_id, &claims.sub).await?;
    }
    let now = Utc::now();
    let chat = ChatRecord {
        id: Uuid::new_v4().to_string(),
        title: "New Chat".to_owned(),
        user_id: claims.sub.clone(),
        model_name: req
            .model_name
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| state.config.default_model.clone()),
        group_id: req.group_id,
        created_at: now,
        updated_at: now,
    };
    state.store.create_chat(chat.clone()).await?;
    Ok((StatusCode::CREATED, Json(chat.to_response())))
}

/// Fetch one chat with its full transcript, oldest message first.
#[utoipa::path(
    get,
    path = "/api/chats/{id}",
    tag = "chats",
    params(("id" = String, Path, description = "Chat id")),
    responses(
        (status = 200, description = "Chat retrieved", body = ChatDetailResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Chat not found")
    )
)]
pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ChatDetailResponse>, ServerError> {
    let chat = load_owned(&state, &id, &claims.sub).await?;
    let messages = state
        .store
        .list_messages(&chat.id)
        .await?
        .iter()
        .map(MessageRecord::to_response)
        .collect();
    Ok(Json(ChatDetailResponse {
        chat: chat.to_response(),
        messages,
    }))
}

/// Partially update a chat.
///
/// Empty `title`/`modelName` are ignored rather than stored; `groupId: null`
/// (or `""`) detaches the chat from its group, while an absent `groupId`
/// leaves the grouping untouched.
#[utoipa::path(
    patch,
    path = "/api/chats/{id}",
    tag = "chats",
    params(("id" = String, Path, description = "Chat id")),
    request_body = UpdateChatRequest,
    responses(
        (status = 200, description = "Chat updated", body = ChatResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Chat (or target group) not found")
    )
)]
pub async fn update_chat(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    let mut chat = load_owned(&state, &id, &claims.sub).await?;
    if let Some(title) = req.title.filter(|t| !t.is_empty()) {
        chat.title = title;
    }
    if let Some(model) = req.model_name.filter(|m| !m.is_empty()) {
        chat.model_name = model;
    }
    if let Some(group) = req.group_id {
        chat.group_id = match group {
            Some(gid) if !gid.is_empty() => {
                ensure_group(&state, &gid, &claims.sub).await?;
                Some(gid)
            }
            _ => None,
        };
    }
    chat.updated_at = Utc::now();
    state.store.update_chat(&chat).await?;
    Ok(Json(chat.to_response()))
}

/// Delete a chat and (via cascade) its transcript.
#[utoipa::path(
    delete,
    path = "/api/chats/{id}",
    tag = "chats",
    params(("id" = String, Path, description = "Chat id")),
    responses(
        (status = 200, description = "Chat deleted", body = Value),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Chat not found")
    )
)]
pub async fn delete_chat(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    let deleted = state.store.delete_chat(&id, &claims.sub).await?;
    if deleted == 0 {
        return Err(ServerError::NotFound("Chat not found".to_owned()));
    }
    Ok(Json(json!({ "success": true })))
}

/// Fetch a chat's transcript as a bare array, oldest first.
#[utoipa::path(
    get,
    path = "/api/chats/{id}/messages",
    tag = "chats",
    params(("id" = String, Path, description = "Chat id")),
    responses(
        (status = 200, description = "Messages listed", body = [MessageResponse]),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Chat not found")
    )
)]
pub async fn list_chat_messages(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, ServerError> {
    let chat = load_owned(&state, &id, &claims.sub).await?;
    let messages = state
        .store
        .list_messages(&chat.id)
        .await?
        .iter()
        .map(MessageRecord::to_response)
        .collect();
    Ok(Json(messages))
}

/// Append a batch of turns to a chat's transcript.
///
/// Entries without non-blank content are dropped; unrecognized roles are
/// recorded as user turns.  Rejected with `400` when nothing in the batch
/// survives filtering.
#[utoipa::path(
    post,
    path = "/api/chats/{id}/messages",
    tag = "chats",
    params(("id" = String, Path, description = "Chat id")),
    request_body = BulkMessagesRequest,
    responses(
        (status = 200, description = "Messages saved", body = BulkSaveResponse),
        (status = 400, description = "No valid messages in the batch"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Chat not found")
    )
)]
pub async fn save_messages(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<BulkMessagesRequest>,
) -> Result<Json<BulkSaveResponse>, ServerError> {
    let chat = load_owned(&state, &id, &claims.sub).await?;
    let valid: Vec<(String, String)> = req
        .messages
        .into_iter()
        .filter_map(|m| {
            let content = m.content?;
            if content.trim().is_empty() {
                return None;
            }
            Some((normalize_role(m.role.as_deref().unwrap_or("")), content))
        })
        .collect();
    if valid.is_empty() {
        return Err(ServerError::BadRequest(
            "No valid messages to save".to_owned(),
        ));
    }
    let count = valid.len();
    for (role, content) in valid {
        state
            .store
            .append_message(MessageRecord {
                id: Uuid::new_v4().to_string(),
                chat_id: chat.id.clone(),
                role,
                content,
                created_at: Utc::now(),
            })
            .await?;
    }
    Ok(Json(BulkSaveResponse {
        success: true,
        count,
    }))
}

/// Load `id` if it belongs to `user_id`, else `404`.
async fn load_owned(
    state: &AppState,
    id: &str,
    user_id: &str,
) -> Result<ChatRecord, ServerError> {
    state
        .store
        .get_chat(id, user_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Chat not found".to_owned()))
}

/// `404` unless `group_id` names a chat group owned by `user_id`.
async fn ensure_group(
    state: &AppState,
    group_id: &str,
    user_id: &str,
) -> Result<(), ServerError> {
    state
        .store
        .get_chat_group(group_id, user_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ServerError::NotFound("Group not found".to_owned()))
}

/// Map a client role string onto the stored role set; anything unrecognized
/// is recorded as a user turn.
fn normalize_role(role: &str) -> String {
    match role.to_ascii_uppercase().as_str() {
        "ASSISTANT" => "ASSISTANT".to_owned(),
        "SYSTEM" => "SYSTEM".to_owned(),
        _ => "USER".to_owned(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
