//! User-group (team) administration.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::{UserGroupRecord, UserStore};
use crate::error::ServerError;
use crate::schemas::admin::groups::{
    AdminGroupResponse, CreateUserGroupRequest, GroupCounts, GroupMember, UpdateUserGroupRequest,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_groups, create_group, get_group, update_group, delete_group),
    components(schemas(
        AdminGroupResponse,
        GroupCounts,
        GroupMember,
        CreateUserGroupRequest,
        UpdateUserGroupRequest
    ))
)]
pub struct GroupsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/{id}",
            get(get_group).patch(update_group).delete(delete_group),
        )
}

/// All teams, alphabetically, with member counts.
#[utoipa::path(
    get,
    path = "/api/admin/groups",
    tag = "admin",
    responses(
        (status = 200, description = "All user groups", body = Vec<AdminGroupResponse>),
        (status = 403, description = "Caller is not an admin")
    )
)]
async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminGroupResponse>>, ServerError> {
    let groups = state.store.list_user_groups().await?;
    let mut out = Vec::with_capacity(groups.len());
    for group in &groups {
        let members = state.store.count_group_members(&group.id).await?;
        out.push(group.to_admin_response(members, None));
    }
    Ok(Json(out))
}

#[utoipa::path(
    post,
    path = "/api/admin/groups",
    tag = "admin",
    request_body = CreateUserGroupRequest,
    responses(
        (status = 201, description = "Group created", body = AdminGroupResponse),
        (status = 400, description = "Missing name")
    )
)]
async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserGroupRequest>,
) -> Result<(StatusCode, Json<AdminGroupResponse>), ServerError> {
    let Some(name) = req.name.filter(|n| !n.is_empty()) else {
        return Err(ServerError::BadRequest("Group name is required".into()));
    };

    let now = Utc::now();
    let group = UserGroupRecord {
        id: Uuid::new_v4().to_string(),
        name,
        description: req.description,
        created_at: now,
        updated_at: now,
    };
    state.store.create_user_group(group.clone()).await?;
    Ok((StatusCode::CREATED, Json(group.to_admin_response(0, None))))
}

/// One team, with its member list.
#[utoipa::path(
    get,
    path = "/api/admin/groups/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Group id")),
    responses(
        (status = 200, description = "The group and its members", body = AdminGroupResponse),
        (status = 404, description = "No such group")
    )
)]
async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AdminGroupResponse>, ServerError> {
    let group = load_group(&state, &id).await?;
    let members: Vec<GroupMember> = state
        .store
        .list_users_in_group(&group.id)
        .await?
        .iter()
        .map(|u| u.to_member())
        .collect();
    let count = members.len() as i64;
    Ok(Json(group.to_admin_response(count, Some(members))))
}

/// Partial update; `description: null` clears the description.
#[utoipa::path(
    patch,
    path = "/api/admin/groups/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Group id")),
    request_body = UpdateUserGroupRequest,
    responses(
        (status = 200, description = "Updated group", body = AdminGroupResponse),
        (status = 404, description = "No such group")
    )
)]
async fn update_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserGroupRequest>,
) -> Result<Json<AdminGroupResponse>, ServerError> {
    let mut group = load_group(&state, &id).await?;
    if let Some(name) = req.name {
        group.name = name;
    }
    if let Some(description) = req.description {
        group.description = description;
    }
    group.updated_at = Utc::now();
    state.store.update_user_group(&group).await?;

    let members = state.store.count_group_members(&group.id).await?;
    Ok(Json(group.to_admin_response(members, None)))
}

/// Remove a team.  Members stay and simply lose the membership.
#[utoipa::path(
    delete,
    path = "/api/admin/groups/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group deleted", body = Value),
        (status = 404, description = "No such group")
    )
)]
async fn delete_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if state.store.delete_user_group(&id).await? == 0 {
        return Err(ServerError::NotFound("Group not found".into()));
    }
    Ok(Json(json!({"success": true})))
}

async fn load_group(state: &AppState, id: &str) -> Result<UserGroupRecord, ServerError> {
    state
        .store
        .get_user_group(id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Group not found".into()))
}

// ── Tests ───────────────────────────────────────────────────────────────────
