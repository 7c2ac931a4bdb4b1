//! User administration.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::entities::{UserGroupRecord, UserRecord, UserStore};
use crate::error::ServerError;
use crate::schemas::admin::users::{
    AdminUserResponse, CreateUserRequest, UpdateUserRequest, UserCounts, UserGroupRef,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_users, create_user, get_user, update_user, delete_user),
    components(schemas(
        AdminUserResponse,
        UserGroupRef,
        UserCounts,
        CreateUserRequest,
        UpdateUserRequest
    ))
)]
pub struct UsersApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// Every account, newest first, with group membership and chat counts.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    responses(
        (status = 200, description = "All users", body = Vec<AdminUserResponse>),
        (status = 403, description = "Caller is not an admin")
    )
)]
async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminUserResponse>>, ServerError> {
    let users = state.store.list_users().await?;
    let groups = group_index(&state).await?;

    let mut out = Vec::with_capacity(users.len());
    for user in &users {
        let chats = state.store.count_user_chats(&user.id).await?;
        out.push(user.to_admin_response(group_ref(&groups, user), chats, None));
    }
    Ok(Json(out))
}

/// Create an account with an already-set password.
#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "admin",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = AdminUserResponse),
        (status = 400, description = "Missing credentials or duplicate email")
    )
)]
async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<AdminUserResponse>), ServerError> {
    let email = req.email.filter(|e| !e.is_empty());
    let password = req.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ServerError::BadRequest(
            "Email and password are required".into(),
        ));
    };

    if state.store.get_user_by_email(&email).await?.is_some() {
        return Err(ServerError::BadRequest(
            "User with this email already exists".into(),
        ));
    }

    let now = Utc::now();
    let user = UserRecord {
        id: Uuid::new_v4().to_string(),
        email,
        name: req.name,
        password_hash: hash_password(&password)?,
        role: req.role.filter(|r| !r.is_empty()).unwrap_or_else(|| "USER".into()),
        is_active: true,
        group_id: req.user_group_id.filter(|g| !g.is_empty()),
        created_at: now,
        updated_at: now,
    };
    state.store.create_user(user.clone()).await?;
    info!(user = %user.email, role = %user.role, "user created");

    let group = resolve_group(&state, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(user.to_admin_response(group.as_ref(), 0, None)),
    ))
}

/// One account, with chat and sidebar-group counts.
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = AdminUserResponse),
        (status = 404, description = "No such user")
    )
)]
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AdminUserResponse>, ServerError> {
    let user = load_user(&state, &id).await?;
    let group = resolve_group(&state, &user).await?;
    let chats = state.store.count_user_chats(&user.id).await?;
    let chat_groups = state.store.count_user_chat_groups(&user.id).await?;
    Ok(Json(user.to_admin_response(
        group.as_ref(),
        chats,
        Some(chat_groups),
    )))
}

/// Partial update.  A set `password` is rehashed; `userGroupId: null`
/// detaches the user from its group.
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = AdminUserResponse),
        (status = 404, description = "No such user")
    )
)]
async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<AdminUserResponse>, ServerError> {
    let mut user = load_user(&state, &id).await?;

    if let Some(name) = req.name {
        user.name = Some(name);
    }
    if let Some(email) = req.email {
        user.email = email;
    }
    if let Some(role) = req.role {
        user.role = role;
    }
    if let Some(active) = req.is_active {
        user.is_active = active;
    }
    if let Some(group) = req.user_group_id {
        user.group_id = group.filter(|g| !g.is_empty());
    }
    if let Some(password) = req.password.filter(|p| !p.is_empty()) {
        user.password_hash = hash_password(&password)?;
    }
    user.updated_at = Utc::now();
    state.store.update_user(&user).await?;

    let group = resolve_group(&state, &user).await?;
    let chats = state.store.count_user_chats(&user.id).await?;
    Ok(Json(user.to_admin_response(group.as_ref(), chats, None)))
}

/// Remove an account and, via cascade, everything it owns.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = Value),
        (status = 404, description = "No such user")
    )
)]
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if state.store.delete_user(&id).await? == 0 {
        return Err(ServerError::NotFound("User not found".into()));
    }
    info!(user = %id, "user deleted");
    Ok(Json(json!({"success": true})))
}

// ── Helpers ─────────────────────────────────────────────────────────────────

async fn load_user(state: &AppState, id: &str) -> Result<UserRecord, ServerError> {
    state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| ServerError::NotFound("User not found".into()))
}

async fn resolve_group(
    state: &AppState,
    user: &UserRecord,
) -> Result<Option<UserGroupRecord>, ServerError> {
    match &user.group_id {
        Some(gid) => Ok(state.store.get_user_group(gid).await?),
        None => Ok(None),
    }
}

async fn group_index(state: &AppState) -> Result<HashMap<String, UserGroupRecord>, ServerError> {
    let groups = state.store.list_user_groups().await?;
    Ok(groups.into_iter().map(|g| (g.id.clone(), g)).collect())
}

fn group_ref<'a>(
    groups: &'a HashMap<String, UserGroupRecord>,
    user: &UserRecord,
) -> Option<&'a UserGroupRecord> {
    user.group_id.as_deref().and_then(|gid| groups.get(gid))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use chrono::Utc;
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::verify_password;
    use crate::entities::{UserGroupRecord, UserStore};
    use crate::routes;
    use crate::test_support::{
        bearer, delete, get, json_body, patch_json, post_json, seed_chat, seed_group, seed_user,
        state,
    };

    async fn seed_user_group(
        state: &std::sync::Arc<crate::state::AppState>,
        name: &str,
    ) -> UserGroupRecord {
        let now = Utc::now();
        let group = UserGroupRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        state.store.create_user_group(group.clone()).await.unwrap();
        group
    }

    #[tokio::test]
    async fn the_admin_gate_rejects_members_and_anonymous_callers() {
        let state = state().await;
        let member = seed_user(&state, "member@acme.io", "pw", "USER").await;
        let token = bearer(&state, &member);

        let response = routes::build(state.clone())
            .oneshot(get("/api/admin/users", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"], "Forbidden");

        let response = routes::build(state.clone())
            .oneshot(get("/api/admin/users", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn listing_resolves_group_membership_and_chat_counts() {
        let state = state().await;
        let admin = seed_user(&state, "root@acme.io", "pw", "ADMIN").await;
        let token = bearer(&state, &admin);
        let group = seed_user_group(&state, "QA team").await;

        let response = routes::build(state.clone())
            .oneshot(post_json(
                "/api/admin/users",
                Some(&token),
                &json!({
                    "name": "Dana",
                    "email": "dana@acme.io",
                    "password": "secret",
                    "userGroupId": group.id,
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["role"], "USER");
        assert_eq!(created["userGroup"]["name"], "QA team");
        assert_eq!(created["_count"]["chats"], 0);

        let dana = state
            .store
            .get_user_by_email("dana@acme.io")
            .await
            .unwrap()
            .unwrap();
        seed_chat(&state, &dana).await;

        let response = routes::build(state.clone())
            .oneshot(get("/api/admin/users", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let listed = body
            .as_array()
            .unwrap()
            .iter()
            .find(|u| u["email"] == "dana@acme.io")
            .unwrap();
        assert_eq!(listed["_count"]["chats"], 1);
        assert_eq!(listed["userGroupId"], group.id.as_str());
        assert!(listed.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn create_requires_credentials_and_rejects_duplicate_emails() {
        let state = state().await;
        let admin = seed_user(&state, "root@acme.io", "pw", "ADMIN").await;
        let token = bearer(&state, &admin);

        let response = routes::build(state.clone())
            .oneshot(post_json(
                "/api/admin/users",
                Some(&token),
                &json!({"email": "dana@acme.io", "password": ""}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "Email and password are required"
        );

        let response = routes::build(state.clone())
            .oneshot(post_json(
                "/api/admin/users",
                Some(&token),
                &json!({"email": "root@acme.io", "password": "secret"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "User with this email already exists"
        );
    }

    #[tokio::test]
    async fn single_view_counts_chats_and_sidebar_groups() {
        let state = state().await;
        let admin = seed_user(&state, "root@acme.io", "pw", "ADMIN").await;
        let token = bearer(&state, &admin);
        let member = seed_user(&state, "member@acme.io", "pw", "USER").await;
        seed_chat(&state, &member).await;
        seed_chat(&state, &member).await;
        seed_group(&state, &member, "Displays", None).await;

        let response = routes::build(state.clone())
            .oneshot(get(&format!("/api/admin/users/{}", member.id), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["_count"]["chats"], 2);
        assert_eq!(body["_count"]["chatGroups"], 1);

        let response = routes::build(state.clone())
            .oneshot(get("/api/admin/users/ghost", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "User not found");
    }

    #[tokio::test]
    async fn patch_rehashes_passwords_and_detaches_groups() {
        let state = state().await;
        let admin = seed_user(&state, "root@acme.io", "pw", "ADMIN").await;
        let token = bearer(&state, &admin);
        let group = seed_user_group(&state, "QA team").await;
        let member = seed_user(&state, "member@acme.io", "old-pw", "USER").await;

        let response = routes::build(state.clone())
            .oneshot(patch_json(
                &format!("/api/admin/users/{}", member.id),
                Some(&token),
                &json!({"userGroupId": group.id, "password": "new-pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["userGroup"]["id"], group.id.as_str());

        let stored = state.store.get_user(&member.id).await.unwrap().unwrap();
        assert!(verify_password("new-pw", &stored.password_hash).unwrap());
        assert!(!verify_password("old-pw", &stored.password_hash).unwrap());

        // An explicit null detaches; an empty password changes nothing.
        let response = routes::build(state.clone())
            .oneshot(patch_json(
                &format!("/api/admin/users/{}", member.id),
                Some(&token),
                &json!({"userGroupId": null, "password": "", "isActive": false}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["userGroup"].is_null());
        assert_eq!(body["isActive"], false);

        let stored = state.store.get_user(&member.id).await.unwrap().unwrap();
        assert!(stored.group_id.is_none());
        assert!(verify_password("new-pw", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn delete_removes_the_row_once() {
        let state = state().await;
        let admin = seed_user(&state, "root@acme.io", "pw", "ADMIN").await;
        let token = bearer(&state, &admin);
        let member = seed_user(&state, "member@acme.io", "pw", "USER").await;

        let response = routes::build(state.clone())
            .oneshot(delete(&format!("/api/admin/users/{}", member.id), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);

        let response = routes::build(state.clone())
            .oneshot(delete(&format!("/api/admin/users/{}", member.id), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
