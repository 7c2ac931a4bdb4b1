//! Analysis-case reference library.
//!
//! `GET` is a filtered listing; `POST` is the similarity lookup the chat UI
//! fires when a new defect is being triaged, split into strict matches
//! (every term) and loose matches (any term, strict hits removed).

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::entities::{CaseQuery, CaseRecord, CaseStore, SimilarityTerms};
use crate::error::ServerError;
use crate::schemas::cases::{
    CaseListParams, CaseResponse, RecentCasesResponse, SimilarCasesRequest,
    SimilarMatchesResponse,
};
use crate::state::AppState;

/// Cap on each similarity bucket, and on the recent-cases fallback.
const SIMILAR_TAKE: i64 = 5;
/// The loose pass over-fetches so it can dedupe against the strict hits and
/// still fill its bucket.
const PARTIAL_FETCH: i64 = 10;

#[derive(OpenApi)]
#[openapi(
    paths(list_cases, similar_cases),
    components(schemas(
        CaseResponse,
        SimilarCasesRequest,
        SimilarMatchesResponse,
        RecentCasesResponse
    ))
)]
pub struct CasesApi;

/// Register case routes (mounted on the authenticated `/api` router).
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/analysis-cases", get(list_cases).post(similar_cases))
}

/// List analysis cases, newest report first, with optional filters.
#[utoipa::path(
    get,
    path = "/api/analysis-cases",
    tag = "cases",
    params(CaseListParams),
    responses(
        (status = 200, description = "Cases listed", body = [CaseResponse]),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_cases(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CaseListParams>,
) -> Result<Json<Vec<CaseResponse>>, ServerError> {
    let query = CaseQuery {
        customer: params.customer.filter(|v| !v.is_empty()),
        product_model: params.product_model.filter(|v| !v.is_empty()),
        defect_type: params.defect_type.filter(|v| !v.is_empty()),
        search: params.search.filter(|v| !v.is_empty()),
        limit: params.limit.unwrap_or(10),
    };
    let cases = state
        .store
        .search_cases(&query)
        .await?
        .iter()
        .map(CaseRecord::to_response)
        .collect();
    Ok(Json(cases))
}

/// Find cases similar to the defect under triage.
///
/// With no usable terms the answer is the five most recent cases, marked
/// `matchType: "recent"`.  Otherwise two passes run: `exactMatches` satisfy
/// every term, `partialMatches` satisfy at least one (with the exact hits
/// filtered out); both buckets are capped at five.
#[utoipa::path(
    post,
    path = "/api/analysis-cases",
    tag = "cases",
    request_body = SimilarCasesRequest,
    responses(
        (status = 200, description = "Similar (or recent) cases", body = SimilarMatchesResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn similar_cases(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SimilarCasesRequest>,
) -> Result<Response, ServerError> {
    let terms = SimilarityTerms {
        customer: req.customer.filter(|v| !v.is_empty()),
        product_model: req.product_model.filter(|v| !v.is_empty()),
        defect_type: req.defect_type.filter(|v| !v.is_empty()),
        keywords: req
            .keywords
            .unwrap_or_default()
            .into_iter()
            .filter(|k| !k.trim().is_empty())
            .collect(),
    };

    if terms.is_empty() {
        let similar_cases = state
            .store
            .recent_cases(SIMILAR_TAKE)
            .await?
            .iter()
            .map(CaseRecord::to_response)
            .collect();
        return Ok(Json(RecentCasesResponse {
            similar_cases,
            match_type: "recent".to_owned(),
        })
        .into_response());
    }

    let exact = state.store.match_all_terms(&terms, SIMILAR_TAKE).await?;
    let loose = state.store.match_any_term(&terms, PARTIAL_FETCH).await?;

    let exact_ids: Vec<&str> = exact.iter().map(|c| c.id.as_str()).collect();
    let partial: Vec<&CaseRecord> = loose
        .iter()
        .filter(|c| !exact_ids.contains(&c.id.as_str()))
        .take(SIMILAR_TAKE as usize)
        .collect();

    let total_found = exact.len() + partial.len();
    Ok(Json(SimilarMatchesResponse {
        exact_matches: exact.iter().map(CaseRecord::to_response).collect(),
        partial_matches: partial.iter().map(|c| c.to_response()).collect(),
        total_found,
    })
    .into_response())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::routes;
    use crate::test_support::{bearer, get, json_body, post_json, seed_case, seed_user, state};

    #[tokio::test]
    async fn listing_filters_by_customer_and_limit() {
        let state = state().await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        seed_case(&state, "Samsung", "LCD-49X", "MURA", "corner glow", 3).await;
        seed_case(&state, "Samsung", "LCD-55Q", "DEAD_PIXEL", "single dot", 2).await;
        seed_case(&state, "LG", "OLED-65", "MURA", "edge band", 1).await;
        let token = bearer(&state, &user);
        let app = routes::build(state.clone());

        let resp = app
            .clone()
            .oneshot(get("/api/analysis-cases?customer=sam", Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        // Newest report first.
        assert_eq!(body[0]["productModel"], "LCD-55Q");

        let resp = app
            .oneshot(get("/api/analysis-cases?limit=1", Some(&token)))
            .await
            .unwrap();
        let body = json_body(resp).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["customer"], "LG");
    }

    #[tokio::test]
    async fn listing_requires_a_token() {
        let state = state().await;
        let app = routes::build(state.clone());
        let resp = app.oneshot(get("/api/analysis-cases", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn similarity_splits_exact_from_partial() {
        let state = state().await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        // Matches both terms.
        seed_case(&state, "Samsung", "LCD-49X", "MURA", "corner glow", 2).await;
        // Matches only the customer.
        seed_case(&state, "Samsung", "OLED-65", "DEAD_PIXEL", "single dot", 1).await;
        // Matches nothing.
        seed_case(&state, "LG", "NANO-75", "SCRATCH", "handling mark", 0).await;
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(post_json(
                "/api/analysis-cases",
                Some(&bearer(&state, &user)),
                &json!({"customer": "samsung", "defectType": "MURA"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;

        assert_eq!(body["exactMatches"].as_array().unwrap().len(), 1);
        assert_eq!(body["exactMatches"][0]["productModel"], "LCD-49X");
        assert_eq!(body["partialMatches"].as_array().unwrap().len(), 1);
        assert_eq!(body["partialMatches"][0]["productModel"], "OLED-65");
        assert_eq!(body["totalFound"], 2);
    }

    #[tokio::test]
    async fn similarity_without_terms_returns_recent_cases() {
        let state = state().await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        for i in 0..7 {
            seed_case(
                &state,
                "Samsung",
                &format!("M-{i}"),
                "MURA",
                "corner glow",
                i,
            )
            .await;
        }
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(post_json(
                "/api/analysis-cases",
                Some(&bearer(&state, &user)),
                &json!({"keywords": ["  "]}),
            ))
            .await
            .unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["matchType"], "recent");
        let similar = body["similarCases"].as_array().unwrap();
        assert_eq!(similar.len(), 5);
        // Most recent report first.
        assert_eq!(similar[0]["productModel"], "M-0");
    }
}
