//! Sign-in and role introspection.
//!
//! Both endpoints sit on the public router: `login` is how a caller obtains a
//! token in the first place, and `check-admin` deliberately answers `false`
//! instead of `401` for anonymous callers so the frontend can render either
//! variant of the navigation without a failing request in the console.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use utoipa::OpenApi;
use validator::Validate;

use crate::auth::verify_password;
use crate::entities::UserStore;
use crate::error::ServerError;
use crate::schemas::auth::{CheckAdminResponse, LoginRequest, LoginResponse, UserResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(login, check_admin),
    components(schemas(LoginRequest, LoginResponse, UserResponse, CheckAdminResponse))
)]
pub struct AuthApi;

/// Register authentication routes (mounted on the public `/api` router).
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/check-admin", get(check_admin))
}

/// Exchange email + password for a bearer token.
///
/// Unknown email, wrong password and deactivated account all produce the
/// same `401` so the response does not leak which accounts exist.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 400, description = "Malformed email or empty password"),
        (status = 401, description = "Credentials rejected")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServerError> {
    if req.validate().is_err() {
        return Err(ServerError::BadRequest(
            "Email and password are required".to_owned(),
        ));
    }
    let Some(user) = state.store.get_user_by_email(&req.email).await? else {
        return Err(ServerError::Unauthorized);
    };
    if !user.is_active || !verify_password(&req.password, &user.password_hash)? {
        return Err(ServerError::Unauthorized);
    }
    let token = state.keys.issue(&user)?;
    tracing::info!(user = %user.email, "login");
    Ok(Json(LoginResponse {
        token,
        user: user.to_session_response(),
    }))
}

/// Report whether the caller is currently an admin.
///
/// Always `200`; anonymous or invalid tokens simply get `isAdmin: false`.
#[utoipa::path(
    get,
    path = "/api/auth/check-admin",
    tag = "auth",
    responses(
        (status = 200, description = "Current admin status", body = CheckAdminResponse)
    )
)]
pub async fn check_admin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<CheckAdminResponse> {
    Json(CheckAdminResponse {
        is_admin: resolve_admin(&state, &headers).await,
    })
}

/// `true` only when the bearer token is valid and the user's role **in the
/// store** is admin.  The role is read fresh rather than trusted from the
/// token so a demotion takes effect before the token expires.
async fn resolve_admin(state: &AppState, headers: &HeaderMap) -> bool {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let Some(token) = token else { return false };
    let Ok(claims) = state.keys.validate(token) else {
        return false;
    };
    matches!(
        state.store.get_user(&claims.sub).await,
        Ok(Some(user)) if user.is_admin()
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────
