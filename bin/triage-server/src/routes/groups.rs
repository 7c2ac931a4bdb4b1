//! Chat group (sidebar folder) CRUD.
//!
//! The listing returns every group the caller owns as a flat array, each
//! entry carrying its chat ids and recursively nested children; the sidebar
//! picks the `parentId: null` entries as roots.  Cycles cannot form because
//! a group's parent is fixed at creation.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::auth::Claims;
use crate::entities::{ChatGroupRecord, ChatStore, GroupStore};
use crate::error::ServerError;
use crate::schemas::groups::{
    CreateGroupRequest, GroupChatRef, GroupNode, GroupResponse, UpdateGroupRequest,
};
use crate::state::AppState;

const DEFAULT_GROUP_COLOR: &str = "#6B7280";

#[derive(OpenApi)]
#[openapi(
    paths(list_groups, create_group, update_group, delete_group),
    components(schemas(
        GroupNode,
        GroupChatRef,
        GroupResponse,
        CreateGroupRequest,
        UpdateGroupRequest
    ))
)]
pub struct GroupsApi;

/// Register group routes (mounted on the authenticated `/api` router).
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/{id}", patch(update_group).delete(delete_group))
}

/// List the caller's groups (flat, oldest first) with chats and children.
#[utoipa::path(
    get,
    path = "/api/groups",
    tag = "groups",
    responses(
        (status = 200, description = "Groups listed", body = [GroupNode]),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<GroupNode>>, ServerError> {
    let groups = state.store.list_chat_groups(&claims.sub).await?;

    // One pass over the caller's chats buckets every chat id by group.
    let mut chats_by_group: HashMap<String, Vec<String>> = HashMap::new();
    for chat in state.store.list_chats(&claims.sub).await? {
        if let Some(group_id) = chat.group_id {
            chats_by_group.entry(group_id).or_default().push(chat.id);
        }
    }

    let nodes = groups
        .iter()
        .map(|g| build_node(g, &groups, &chats_by_group))
        .collect();
    Ok(Json(nodes))
}

/// Create a group, optionally under a parent the caller owns.
#[utoipa::path(
    post,
    path = "/api/groups",
    tag = "groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupNode),
        (status = 400, description = "Missing group name"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Parent group not found")
    )
)]
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupNode>), ServerError> {
    let Some(name) = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
        return Err(ServerError::BadRequest("Group name is required".to_owned()));
    };
    if let Some(parent_id) = req.parent_id.as_deref().filter(|p| !p.is_empty()) {
        if state
            .store
            .get_chat_group(parent_id, &claims.sub)
            .await?
            .is_none()
        {
            return Err(ServerError::NotFound("Parent group not found".to_owned()));
        }
    }
    let now = Utc::now();
    let group = ChatGroupRecord {
        id: Uuid::new_v4().to_string(),
        name: name.to_owned(),
        user_id: claims.sub.clone(),
        parent_id: req.parent_id.filter(|p| !p.is_empty()),
        color: Some(
            req.color
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_GROUP_COLOR.to_owned()),
        ),
        created_at: now,
        updated_at: now,
    };
    state.store.create_chat_group(group.clone()).await?;
    // A fresh group has no chats and no children.
    Ok((
        StatusCode::CREATED,
        Json(build_node(&group, &[], &HashMap::new())),
    ))
}

/// Rename or recolor a group.  Empty fields leave the current value alone.
#[utoipa::path(
    patch,
    path = "/api/groups/{id}",
    tag = "groups",
    params(("id" = String, Path, description = "Group id")),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated", body = GroupResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Group not found")
    )
)]
pub async fn update_group(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateGroupRequest>,
) -> Result<Json<GroupResponse>, ServerError> {
    let mut group = state
        .store
        .get_chat_group(&id, &claims.sub)
        .await?
        .ok_or_else(|| ServerError::NotFound("Group not found".to_owned()))?;
    if let Some(name) = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        group.name = name.to_owned();
    }
    if let Some(color) = req.color.filter(|c| !c.is_empty()) {
        group.color = Some(color);
    }
    group.updated_at = Utc::now();
    state.store.update_chat_group(&group).await?;
    Ok(Json(group.to_response()))
}

/// Delete a group.  Its chats become ungrouped and its child groups are
/// promoted to roots.
#[utoipa::path(
    delete,
    path = "/api/groups/{id}",
    tag = "groups",
    params(("id" = String, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group deleted", body = Value),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Group not found")
    )
)]
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    let deleted = state.store.delete_chat_group(&id, &claims.sub).await?;
    if deleted == 0 {
        return Err(ServerError::NotFound("Group not found".to_owned()));
    }
    Ok(Json(json!({ "success": true })))
}

/// Assemble the response node for `group`, nesting children to any depth.
fn build_node(
    group: &ChatGroupRecord,
    all: &[ChatGroupRecord],
    chats_by_group: &HashMap<String, Vec<String>>,
) -> GroupNode {
    GroupNode {
        id: group.id.clone(),
        name: group.name.clone(),
        color: group.color.clone(),
        parent_id: group.parent_id.clone(),
        created_at: group.created_at.to_rfc3339(),
        updated_at: group.updated_at.to_rfc3339(),
        chats: chats_by_group
            .get(&group.id)
            .map(|ids| {
                ids.iter()
                    .map(|id| GroupChatRef { id: id.clone() })
                    .collect()
            })
            .unwrap_or_default(),
        children: all
            .iter()
            .filter(|g| g.parent_id.as_deref() == Some(group.id.as_str()))
            .map(|g| build_node(g, all, chats_by_group))
            .collect(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::entities::{ChatStore, GroupStore};
    use crate::routes;
    use crate::test_support::{
        bearer, delete, get, json_body, patch_json, post_json, seed_chat, seed_group, seed_user,
        state,
    };

    #[tokio::test]
    async fn listing_nests_children_and_collects_chat_ids() {
        let state = state().await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        let root = seed_group(&state, &user, "Displays", None).await;
        let child = seed_group(&state, &user, "Mura", Some(&root.id)).await;
        let mut chat = seed_chat(&state, &user).await;
        chat.group_id = Some(child.id.clone());
        state.store.update_chat(&chat).await.unwrap();
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(get("/api/groups", Some(&bearer(&state, &user))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        let list = body.as_array().unwrap();
        // Flat listing: both groups appear at top level.
        assert_eq!(list.len(), 2);

        let top = list.iter().find(|g| g["id"] == root.id).unwrap();
        assert_eq!(top["children"][0]["id"], child.id);
        assert_eq!(top["children"][0]["chats"][0]["id"], chat.id);
    }

    #[tokio::test]
    async fn create_requires_a_name_and_applies_defaults() {
        let state = state().await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        let token = bearer(&state, &user);
        let app = routes::build(state.clone());

        let resp = app
            .clone()
            .oneshot(post_json("/api/groups", Some(&token), &json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "Group name is required");

        let resp = app
            .oneshot(post_json(
                "/api/groups",
                Some(&token),
                &json!({"name": "  Backlight  "}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = json_body(resp).await;
        assert_eq!(body["name"], "Backlight");
        assert_eq!(body["color"], "#6B7280");
        assert!(body["chats"].as_array().unwrap().is_empty());
        assert!(body["children"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_a_parent_owned_by_someone_else() {
        let state = state().await;
        let owner = seed_user(&state, "owner@example.com", "pw", "USER").await;
        let other = seed_user(&state, "other@example.com", "pw", "USER").await;
        let foreign = seed_group(&state, &owner, "Private", None).await;
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(post_json(
                "/api/groups",
                Some(&bearer(&state, &other)),
                &json!({"name": "Mine", "parentId": foreign.id}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(resp).await["error"], "Parent group not found");
    }

    #[tokio::test]
    async fn patch_trims_the_name_and_keeps_untouched_fields() {
        let state = state().await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        let group = seed_group(&state, &user, "Old", None).await;
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(patch_json(
                &format!("/api/groups/{}", group.id),
                Some(&bearer(&state, &user)),
                &json!({"name": "  New  "}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["name"], "New");
        assert_eq!(body["color"], "#6B7280");
    }

    #[tokio::test]
    async fn delete_promotes_children_and_detaches_chats() {
        let state = state().await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        let root = seed_group(&state, &user, "Displays", None).await;
        let child = seed_group(&state, &user, "Mura", Some(&root.id)).await;
        let mut chat = seed_chat(&state, &user).await;
        chat.group_id = Some(root.id.clone());
        state.store.update_chat(&chat).await.unwrap();
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(delete(
                &format!("/api/groups/{}", root.id),
                Some(&bearer(&state, &user)),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["success"], true);

        let promoted = state
            .store
            .get_chat_group(&child.id, &user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(promoted.parent_id, None);
        let detached = state.store.get_chat(&chat.id, &user.id).await.unwrap().unwrap();
        assert_eq!(detached.group_id, None);
    }
}
