//! Bearer-token authentication for the `/api` surface.
//!
//! [`require_auth`] validates the JWT and stores the decoded [`Claims`] in
//! request extensions for handlers (and [`require_admin`]) to read.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::Claims;
use crate::error::ServerError;
use crate::state::AppState;

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let Some(token) = provided else {
        return ServerError::Unauthorized.into_response();
    };
    match state.keys.validate(token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Reject non-admin callers.  Must be layered inside [`require_auth`] so the
/// claims are already present.
pub async fn require_admin(req: Request<Body>, next: Next) -> Response {
    match req.extensions().get::<Claims>() {
        Some(claims) if claims.is_admin() => next.run(req).await,
        Some(_) => ServerError::Forbidden.into_response(),
        None => ServerError::Unauthorized.into_response(),
    }
}
