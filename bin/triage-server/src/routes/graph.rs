//! Inference-backend introspection.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(graph_info))]
pub struct GraphApi;

/// Register graph routes (mounted on the public `/api` router: the landing
/// page shows backend capabilities before sign-in).
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/graph/info", get(graph_info))
}

/// Proxy the backend's self-description (`GET /graph/info`) unmodified.
#[utoipa::path(
    get,
    path = "/api/graph/info",
    tag = "graph",
    responses(
        (status = 200, description = "Backend graph description", body = Value),
        (status = 502, description = "Inference backend unreachable")
    )
)]
pub async fn graph_info(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ServerError> {
    Ok(Json(state.graph.graph_info().await?))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::routes;
    use crate::test_support::{get, json_body, state, state_with_backend};

    #[tokio::test]
    async fn graph_info_passes_the_backend_payload_through() {
        let app = axum::Router::new().route(
            "/graph/info",
            axum::routing::get(|| async {
                axum::Json(json!({"nodes": ["classify", "retrieve", "answer"]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let state = state_with_backend(&format!("http://{addr}")).await;
        let app = routes::build(state);
        let resp = app.oneshot(get("/api/graph/info", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["nodes"][0], "classify");
    }

    #[tokio::test]
    async fn graph_info_maps_a_dead_backend_to_502() {
        let state = state().await;
        let app = routes::build(state);
        let resp = app.oneshot(get("/api/graph/info", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
