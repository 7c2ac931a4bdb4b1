//! Guided data-collection wizard.
//!
//! Sessions are in-memory state machines from the `triage-collect` crate,
//! keyed by a server-issued id.  A client picks an analysis target, tunes
//! which sources to pull, then walks the steps one confirm/skip at a time
//! until the final review hands back a context document for the chat.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::debug;
use triage_collect::{AnalysisTarget, CollectError, CollectSession, CollectStep};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::ServerError;
use crate::schemas::collect::{
    CollectSessionResponse, ConfirmStepRequest, ContextResponse, CreateCollectSessionRequest,
    RestartCollectRequest, StepToggleRequest,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_targets,
        create_session,
        get_session,
        toggle_step,
        start_session,
        confirm_step,
        skip_step,
        restart_session,
        session_context,
        delete_session
    ),
    components(schemas(
        CollectSessionResponse,
        ContextResponse,
        CreateCollectSessionRequest,
        RestartCollectRequest,
        StepToggleRequest,
        ConfirmStepRequest
    ))
)]
pub struct CollectApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/collect/targets", get(list_targets))
        .route("/collect/sessions", post(create_session))
        .route(
            "/collect/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/collect/sessions/{id}/steps/{step}", post(toggle_step))
        .route("/collect/sessions/{id}/start", post(start_session))
        .route("/collect/sessions/{id}/confirm", post(confirm_step))
        .route("/collect/sessions/{id}/skip", post(skip_step))
        .route("/collect/sessions/{id}/restart", post(restart_session))
        .route("/collect/sessions/{id}/context", get(session_context))
}

/// The analysis targets a session can be opened against.
#[utoipa::path(
    get,
    path = "/api/collect/targets",
    tag = "collect",
    responses(
        (status = 200, description = "Selectable analysis targets", body = Vec<Value>),
        (status = 401, description = "Missing or invalid token")
    )
)]
async fn list_targets(State(state): State<Arc<AppState>>) -> Json<Vec<AnalysisTarget>> {
    Json(state.dataset.targets.clone())
}

/// Open a new collection session for one target.
#[utoipa::path(
    post,
    path = "/api/collect/sessions",
    tag = "collect",
    request_body = CreateCollectSessionRequest,
    responses(
        (status = 201, description = "Session created", body = CollectSessionResponse),
        (status = 404, description = "Unknown target")
    )
)]
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCollectSessionRequest>,
) -> Result<(StatusCode, Json<CollectSessionResponse>), ServerError> {
    let target = state
        .dataset
        .target(&req.target_id)
        .cloned()
        .ok_or_else(|| ServerError::NotFound("Target not found".into()))?;

    let id = Uuid::new_v4().to_string();
    let session = CollectSession::new(target);
    let response = CollectSessionResponse::from_session(&id, &session);
    state.collect.insert(id, session);

    debug!(
        session = %response.session_id,
        target = %response.target.id,
        "collect session opened"
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// Current state of a session.
#[utoipa::path(
    get,
    path = "/api/collect/sessions/{id}",
    tag = "collect",
    params(("id" = String, Path, description = "Collect session id")),
    responses(
        (status = 200, description = "Session state", body = CollectSessionResponse),
        (status = 404, description = "Unknown session")
    )
)]
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CollectSessionResponse>, ServerError> {
    let view = state
        .collect
        .with(&id, |s| CollectSessionResponse::from_session(&id, s))
        .ok_or_else(session_not_found)?;
    Ok(Json(view))
}

/// Enable or disable one step.  Only allowed before the session starts.
#[utoipa::path(
    post,
    path = "/api/collect/sessions/{id}/steps/{step}",
    tag = "collect",
    params(
        ("id" = String, Path, description = "Collect session id"),
        ("step" = String, Path, description = "Step name, e.g. `erp_shipment`")
    ),
    request_body = StepToggleRequest,
    responses(
        (status = 200, description = "Step toggled", body = CollectSessionResponse),
        (status = 400, description = "Unknown step or session already started"),
        (status = 404, description = "Unknown session")
    )
)]
async fn toggle_step(
    State(state): State<Arc<AppState>>,
    Path((id, step)): Path<(String, String)>,
    Json(req): Json<StepToggleRequest>,
) -> Result<Json<CollectSessionResponse>, ServerError> {
    let step: CollectStep = step
        .parse()
        .map_err(|_| ServerError::BadRequest(format!("Unknown step: {step}")))?;
    let view = mutate(&state, &id, |s| s.set_enabled(step, req.enabled))?;
    Ok(Json(view))
}

/// Leave the setup phase and begin collecting the first enabled step.
#[utoipa::path(
    post,
    path = "/api/collect/sessions/{id}/start",
    tag = "collect",
    responses(
        (status = 200, description = "Collection started", body = CollectSessionResponse),
        (status = 400, description = "Session already started"),
        (status = 404, description = "Unknown session")
    ),
    params(("id" = String, Path, description = "Collect session id"))
)]
async fn start_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CollectSessionResponse>, ServerError> {
    let view = mutate(&state, &id, |s| s.start(&state.dataset).map(|_| ()))?;
    Ok(Json(view))
}

/// Accept the current step's records, with an optional analyst comment.
#[utoipa::path(
    post,
    path = "/api/collect/sessions/{id}/confirm",
    tag = "collect",
    request_body = ConfirmStepRequest,
    responses(
        (status = 200, description = "Step confirmed", body = CollectSessionResponse),
        (status = 400, description = "No step in progress"),
        (status = 404, description = "Unknown session")
    ),
    params(("id" = String, Path, description = "Collect session id"))
)]
async fn confirm_step(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<ConfirmStepRequest>>,
) -> Result<Json<CollectSessionResponse>, ServerError> {
    let comment = body.and_then(|Json(b)| b.comment);
    let view = mutate(&state, &id, |s| {
        s.confirm(&state.dataset, comment).map(|_| ())
    })?;
    Ok(Json(view))
}

/// Pass over the current step without taking its records.
#[utoipa::path(
    post,
    path = "/api/collect/sessions/{id}/skip",
    tag = "collect",
    responses(
        (status = 200, description = "Step skipped", body = CollectSessionResponse),
        (status = 400, description = "No step in progress"),
        (status = 404, description = "Unknown session")
    ),
    params(("id" = String, Path, description = "Collect session id"))
)]
async fn skip_step(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CollectSessionResponse>, ServerError> {
    let view = mutate(&state, &id, |s| s.skip(&state.dataset).map(|_| ()))?;
    Ok(Json(view))
}

/// Throw away all progress and point the session at a new target.
#[utoipa::path(
    post,
    path = "/api/collect/sessions/{id}/restart",
    tag = "collect",
    request_body = RestartCollectRequest,
    responses(
        (status = 200, description = "Session reset", body = CollectSessionResponse),
        (status = 404, description = "Unknown session or target")
    ),
    params(("id" = String, Path, description = "Collect session id"))
)]
async fn restart_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RestartCollectRequest>,
) -> Result<Json<CollectSessionResponse>, ServerError> {
    let target = state
        .dataset
        .target(&req.target_id)
        .cloned()
        .ok_or_else(|| ServerError::NotFound("Target not found".into()))?;
    let view = mutate(&state, &id, |s| {
        s.restart(target);
        Ok(())
    })?;
    Ok(Json(view))
}

/// The assembled context document.  Only available in final review.
#[utoipa::path(
    get,
    path = "/api/collect/sessions/{id}/context",
    tag = "collect",
    responses(
        (status = 200, description = "Context document", body = ContextResponse),
        (status = 400, description = "Collection not finished"),
        (status = 404, description = "Unknown session")
    ),
    params(("id" = String, Path, description = "Collect session id"))
)]
async fn session_context(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ContextResponse>, ServerError> {
    let context = state
        .collect
        .with(&id, |s| s.context_document())
        .ok_or_else(session_not_found)?
        .map_err(collect_err)?;
    Ok(Json(ContextResponse { context }))
}

/// Drop a session.
#[utoipa::path(
    delete,
    path = "/api/collect/sessions/{id}",
    tag = "collect",
    responses(
        (status = 200, description = "Session dropped", body = Value),
        (status = 404, description = "Unknown session")
    ),
    params(("id" = String, Path, description = "Collect session id"))
)]
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if !state.collect.remove(&id) {
        return Err(session_not_found());
    }
    debug!(session = %id, "collect session dropped");
    Ok(Json(json!({"success": true})))
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Apply `op` to the session and return the refreshed view, holding the
/// session lock across both so concurrent calls cannot interleave.
fn mutate(
    state: &AppState,
    id: &str,
    op: impl FnOnce(&mut CollectSession) -> Result<(), CollectError>,
) -> Result<CollectSessionResponse, ServerError> {
    state
        .collect
        .with(id, |s| {
            op(s).map(|_| CollectSessionResponse::from_session(id, s))
        })
        .ok_or_else(session_not_found)?
        .map_err(collect_err)
}

fn session_not_found() -> ServerError {
    ServerError::NotFound("Collect session not found".into())
}

fn collect_err(err: CollectError) -> ServerError {
    ServerError::BadRequest(err.to_string())
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::routes;
    use crate::test_support::{bearer, delete, get, json_body, post_json, seed_user, state};

    async fn open_session(
        state: &std::sync::Arc<crate::state::AppState>,
        token: &str,
        target_id: &str,
    ) -> String {
        let response = routes::build(state.clone())
            .oneshot(post_json(
                "/api/collect/sessions",
                Some(token),
                &json!({"targetId": target_id}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        body["sessionId"].as_str().unwrap().to_string()
    }

    async fn post_empty(
        state: &std::sync::Arc<crate::state::AppState>,
        token: &str,
        path: &str,
    ) -> Value {
        let response = routes::build(state.clone())
            .oneshot(post_json(path, Some(token), &json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await
    }

    #[tokio::test]
    async fn targets_listing_returns_the_builtin_catalogue() {
        let state = state().await;
        let user = seed_user(&state, "analyst@acme.io", "pw", "USER").await;
        let token = bearer(&state, &user);

        let response = routes::build(state.clone())
            .oneshot(get("/api/collect/targets", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = routes::build(state.clone())
            .oneshot(get("/api/collect/targets", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let targets = body.as_array().unwrap();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0]["id"], "TGT-2024-001");
        assert!(targets[0]["productModel"].is_string());
    }

    #[tokio::test]
    async fn session_walks_from_start_to_a_context_document() {
        let state = state().await;
        let user = seed_user(&state, "analyst@acme.io", "pw", "USER").await;
        let token = bearer(&state, &user);
        let id = open_session(&state, &token, "TGT-2024-001").await;

        let view = post_empty(&state, &token, &format!("/api/collect/sessions/{id}/start")).await;
        assert_eq!(view["phase"], "erp_shipment");
        assert!(view["currentRecords"].is_array());

        let response = routes::build(state.clone())
            .oneshot(post_json(
                &format!("/api/collect/sessions/{id}/confirm"),
                Some(&token),
                &json!({"comment": "Numbers match the shipment ledger"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        assert_eq!(view["steps"][0]["confirmed"], true);
        assert_eq!(view["steps"][0]["comment"], "Numbers match the shipment ledger");

        // Pass over the remaining six steps.
        let mut view = view;
        while view["phase"] != "final_review" {
            view = post_empty(&state, &token, &format!("/api/collect/sessions/{id}/skip")).await;
        }
        assert_eq!(view["steps"][1]["skipped"], true);

        let response = routes::build(state.clone())
            .oneshot(get(&format!("/api/collect/sessions/{id}/context"), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let context = body["context"].as_str().unwrap();
        assert!(context.contains("# Quality analysis data package"));
        assert!(context.contains("LOT20241203001"));
        assert!(context.contains("[User comment] Numbers match the shipment ledger"));
    }

    #[tokio::test]
    async fn steps_can_only_be_toggled_before_start() {
        let state = state().await;
        let user = seed_user(&state, "analyst@acme.io", "pw", "USER").await;
        let token = bearer(&state, &user);
        let id = open_session(&state, &token, "TGT-2024-002").await;

        let response = routes::build(state.clone())
            .oneshot(post_json(
                &format!("/api/collect/sessions/{id}/steps/defect_history"),
                Some(&token),
                &json!({"enabled": false}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        let defect_step = view["steps"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["step"] == "defect_history")
            .unwrap();
        assert_eq!(defect_step["enabled"], false);

        let response = routes::build(state.clone())
            .oneshot(post_json(
                &format!("/api/collect/sessions/{id}/steps/warp_drive"),
                Some(&token),
                &json!({"enabled": false}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Unknown step: warp_drive");

        post_empty(&state, &token, &format!("/api/collect/sessions/{id}/start")).await;
        let response = routes::build(state.clone())
            .oneshot(post_json(
                &format!("/api/collect/sessions/{id}/steps/defect_history"),
                Some(&token),
                &json!({"enabled": true}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "collection already started"
        );
    }

    #[tokio::test]
    async fn unknown_sessions_and_targets_are_not_found() {
        let state = state().await;
        let user = seed_user(&state, "analyst@acme.io", "pw", "USER").await;
        let token = bearer(&state, &user);

        let response = routes::build(state.clone())
            .oneshot(post_json(
                "/api/collect/sessions",
                Some(&token),
                &json!({"targetId": "TGT-9999-404"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "Target not found");

        for request in [
            get("/api/collect/sessions/nope", Some(&token)),
            post_json("/api/collect/sessions/nope/start", Some(&token), &json!({})),
            delete("/api/collect/sessions/nope", Some(&token)),
        ] {
            let response = routes::build(state.clone()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(
                json_body(response).await["error"],
                "Collect session not found"
            );
        }
    }

    #[tokio::test]
    async fn restart_resets_progress_onto_a_fresh_target() {
        let state = state().await;
        let user = seed_user(&state, "analyst@acme.io", "pw", "USER").await;
        let token = bearer(&state, &user);
        let id = open_session(&state, &token, "TGT-2024-001").await;

        post_empty(&state, &token, &format!("/api/collect/sessions/{id}/start")).await;
        post_empty(&state, &token, &format!("/api/collect/sessions/{id}/confirm")).await;

        let response = routes::build(state.clone())
            .oneshot(post_json(
                &format!("/api/collect/sessions/{id}/restart"),
                Some(&token),
                &json!({"targetId": "TGT-2024-002"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        assert_eq!(view["phase"], "init");
        assert_eq!(view["target"]["id"], "TGT-2024-002");
        assert!(
            view["steps"]
                .as_array()
                .unwrap()
                .iter()
                .all(|s| s["confirmed"] == false && s["skipped"] == false)
        );

        let response = routes::build(state.clone())
            .oneshot(delete(&format!("/api/collect/sessions/{id}"), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);

        let response = routes::build(state.clone())
            .oneshot(get(&format!("/api/collect/sessions/{id}"), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn context_is_refused_before_final_review() {
        let state = state().await;
        let user = seed_user(&state, "analyst@acme.io", "pw", "USER").await;
        let token = bearer(&state, &user);
        let id = open_session(&state, &token, "TGT-2024-003").await;

        post_empty(&state, &token, &format!("/api/collect/sessions/{id}/start")).await;
        let response = routes::build(state.clone())
            .oneshot(get(&format!("/api/collect/sessions/{id}/context"), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "collection not finished"
        );
    }
}
