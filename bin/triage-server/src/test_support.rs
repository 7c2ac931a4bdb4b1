//! Shared fixtures for handler tests: in-memory state, seeded users and
//! request/response plumbing for driving the router with
//! `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, header, request::Builder};
use axum::response::Response;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{TokenKeys, hash_password};
use crate::config::Config;
use crate::entities::{
    CaseRecord, CaseStore, ChatGroupRecord, ChatRecord, ChatStore, ConfigStore, GroupStore,
    ModelConfigRecord, SqliteStore, UserRecord, UserStore,
};
use crate::state::{AppState, CollectSessions};
use crate::upstream::GraphClient;
use triage_collect::Dataset;

/// Test configuration: in-memory database, outbound URLs pointed at ports
/// nothing listens on.
pub(crate) fn config(backend_url: &str) -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_owned(),
        database_url: "sqlite::memory:".to_owned(),
        backend_url: backend_url.to_owned(),
        default_model: "qwen3:32b".to_owned(),
        ollama_host: "http://127.0.0.1:1".to_owned(),
        auth_secret: "test-secret".to_owned(),
        token_ttl_hours: 1,
        admin_email: "admin@triage.local".to_owned(),
        admin_password: "admin1234".to_owned(),
        log_level: "info".to_owned(),
        log_json: false,
        enable_swagger: false,
        cors_allowed_origins: None,
    }
}

/// Fresh state over an in-memory database, with no reachable backend.
pub(crate) async fn state() -> Arc<AppState> {
    state_with_backend("http://127.0.0.1:9").await
}

/// Fresh state pointed at a live (scripted) backend URL.
pub(crate) async fn state_with_backend(backend_url: &str) -> Arc<AppState> {
    let config = config(backend_url);
    let store = SqliteStore::connect(&config.database_url)
        .await
        .expect("in-memory store");
    let keys = TokenKeys::new(&config.auth_secret, config.token_ttl_hours);
    let graph = GraphClient::new(&config.backend_url);
    Arc::new(AppState {
        config: Arc::new(config),
        store: Arc::new(store),
        keys,
        graph,
        collect: Arc::new(CollectSessions::new()),
        dataset: Arc::new(Dataset::builtin()),
    })
}

/// Insert a user with a real password hash and return the row.
pub(crate) async fn seed_user(
    state: &AppState,
    email: &str,
    password: &str,
    role: &str,
) -> UserRecord {
    let now = Utc::now();
    let user = UserRecord {
        id: Uuid::new_v4().to_string(),
        email: email.to_owned(),
        name: Some("Test User".to_owned()),
        password_hash: hash_password(password).expect("hash test password"),
        role: role.to_owned(),
        is_active: true,
        group_id: None,
        created_at: now,
        updated_at: now,
    };
    state
        .store
        .create_user(user.clone())
        .await
        .expect("seed user");
    user
}

/// Insert an untitled chat owned by `user` and return the row.
pub(crate) async fn seed_chat(state: &AppState, user: &UserRecord) -> ChatRecord {
    let now = Utc::now();
    let chat = ChatRecord {
        id: Uuid::new_v4().to_string(),
        title: "New Chat".to_owned(),
        user_id: user.id.clone(),
        model_name: "qwen3:32b".to_owned(),
        group_id: None,
        created_at: now,
        updated_at: now,
    };
    state
        .store
        .create_chat(chat.clone())
        .await
        .expect("seed chat");
    chat
}

/// Insert a chat group owned by `user` and return the row.
pub(crate) async fn seed_group(
    state: &AppState,
    user: &UserRecord,
    name: &str,
    parent_id: Option<&str>,
) -> ChatGroupRecord {
    let now = Utc::now();
    let group = ChatGroupRecord {
        id: Uuid::new_v4().to_string(),
        name: name.to_owned(),
        user_id: user.id.clone(),
        parent_id: parent_id.map(str::to_owned),
        color: Some("#6B7280".to_owned()),
        created_at: now,
        updated_at: now,
    };
    state
        .store
        .create_chat_group(group.clone())
        .await
        .expect("seed group");
    group
}

/// Insert a model configuration and return the row.
pub(crate) async fn seed_model(
    state: &AppState,
    name: &str,
    is_default: bool,
    is_active: bool,
) -> ModelConfigRecord {
    let now = Utc::now();
    let model = ModelConfigRecord {
        id: Uuid::new_v4().to_string(),
        name: name.to_owned(),
        display_name: name.to_uppercase(),
        provider: "OLLAMA".to_owned(),
        endpoint: None,
        api_key: Some("sk-test".to_owned()),
        is_active,
        is_default,
        temperature: 0.7,
        max_tokens: 4096,
        system_prompt: None,
        created_at: now,
        updated_at: now,
    };
    state
        .store
        .create_model_config(model.clone())
        .await
        .expect("seed model");
    model
}

/// Insert an analysis case and return the row.  `reported_at` is spread
/// backwards by `age_days` so listings have a stable recency order.
pub(crate) async fn seed_case(
    state: &AppState,
    customer: &str,
    product_model: &str,
    defect_type: &str,
    description: &str,
    age_days: i64,
) -> CaseRecord {
    let now = Utc::now();
    let case = CaseRecord {
        id: Uuid::new_v4().to_string(),
        customer: customer.to_owned(),
        product_model: product_model.to_owned(),
        lot_id: None,
        cell_id: None,
        defect_type: defect_type.to_owned(),
        defect_description: description.to_owned(),
        root_cause: None,
        analysis_result: None,
        corrective_action: None,
        tags: "[]".to_owned(),
        reported_at: now - chrono::Duration::days(age_days),
        created_at: now,
    };
    state
        .store
        .insert_case(case.clone())
        .await
        .expect("seed case");
    case
}

/// `Authorization` header value for `user`.
pub(crate) fn bearer(state: &AppState, user: &UserRecord) -> String {
    format!("Bearer {}", state.keys.issue(user).expect("sign test token"))
}

// ── Request / response plumbing ───────────────────────────────────────────────

pub(crate) fn get(path: &str, auth: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method("GET").uri(path), auth)
        .body(Body::empty())
        .unwrap()
}

pub(crate) fn delete(path: &str, auth: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method("DELETE").uri(path), auth)
        .body(Body::empty())
        .unwrap()
}

pub(crate) fn post_json(path: &str, auth: Option<&str>, body: &Value) -> Request<Body> {
    with_json(Request::builder().method("POST").uri(path), auth, body)
}

pub(crate) fn patch_json(path: &str, auth: Option<&str>, body: &Value) -> Request<Body> {
    with_json(Request::builder().method("PATCH").uri(path), auth, body)
}

fn with_json(builder: Builder, auth: Option<&str>, body: &Value) -> Request<Body> {
    with_auth(builder, auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn with_auth(mut builder: Builder, auth: Option<&str>) -> Builder {
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder
}

/// Collect the whole response body and parse it as JSON.
pub(crate) async fn json_body(resp: Response) -> Value {
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// Collect the whole response body as text (for the streaming endpoint).
pub(crate) async fn text_body(resp: Response) -> String {
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("UTF-8 body")
}
