//! The streaming chat relay.
//!
//! `POST /api/chat` forwards the submitted conversation to the inference
//! backend, translates the backend's SSE token stream into the client frame
//! protocol (`0:` text fragments, `d:` debug events) and records the
//! transcript: the newest user turn synchronously before the backend call,
//! the assembled assistant reply at clean end-of-stream.  See
//! [`crate::relay`] for the stream mechanics.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::Response;
use axum::routing::post;
use axum::{Extension, Json, Router};
use chrono::Utc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::auth::Claims;
use crate::entities::{ChatRecord, ChatStore, MessageRecord};
use crate::error::ServerError;
use crate::relay::{PersistReply, spawn_relay};
use crate::schemas::chat::{ChatRelayRequest, Turn, TurnPart};
use crate::state::AppState;
use crate::upstream::{GraphChatRequest, GraphMessage};

/// Longest derived chat title, in characters.
const TITLE_MAX_CHARS: usize = 50;

#[derive(OpenApi)]
#[openapi(
    paths(relay_chat),
    components(schemas(ChatRelayRequest, Turn, TurnPart))
)]
pub struct ChatApi;

/// Register the relay route (mounted on the authenticated `/api` router).
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(relay_chat))
}

/// Relay a conversation to the inference backend and stream the reply.
///
/// The response body is not JSON: it is a newline-delimited frame stream
/// (`0:<json string>` per text fragment, `d:<json object>` per progress event
/// when `debug` is set).  When `chatId` names a chat owned by the caller, the
/// newest user turn is persisted before the backend call and the assistant
/// reply after the stream completes; a mid-stream failure persists nothing.
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body = ChatRelayRequest,
    responses(
        (status = 200, description = "Frame stream follows", body = String),
        (status = 400, description = "Empty message list"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "chatId does not name a chat owned by the caller"),
        (status = 502, description = "Inference backend refused the request"),
    )
)]
pub async fn relay_chat(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChatRelayRequest>,
) -> Result<Response, ServerError> {
    if req.messages.is_empty() {
        return Err(ServerError::BadRequest(
            "messages must not be empty".to_owned(),
        ));
    }
    let debug_frames = req.debug.unwrap_or(false);
    let model = req
        .model
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(&state.config.default_model)
        .to_owned();

    debug!(
        user = %claims.sub,
        model = %model,
        turns = req.messages.len(),
        chat = ?req.chat_id,
        "relay request"
    );

    // Transcript recording is keyed to chat ownership: a chatId the caller
    // does not own fails here, before any backend traffic.
    let persist = match &req.chat_id {
        Some(chat_id) => {
            let chat = state
                .store
                .get_chat(chat_id, &claims.sub)
                .await?
                .ok_or_else(|| ServerError::NotFound("Chat not found".to_owned()))?;
            record_user_turn(&state, &chat, &req.messages).await?;
            Some(PersistReply {
                store: state.store.clone(),
                chat_id: chat.id,
            })
        }
        None => None,
    };

    let messages = req
        .messages
        .iter()
        .map(|t| GraphMessage {
            role: t.role.clone(),
            content: t.text(),
        })
        .collect();
    let upstream = state
        .graph
        .chat_stream(&GraphChatRequest {
            messages,
            model,
            debug: debug_frames,
        })
        .await?;

    let rx = spawn_relay(upstream.bytes_stream(), debug_frames, persist);
    let resp = Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(ReceiverStream::new(rx)))
        .map_err(|e| ServerError::Internal(format!("building stream response: {e}")))?;
    Ok(resp)
}

/// Persist the newest user turn, and derive the chat title from it when it
/// opens the conversation.
///
/// A trailing non-user turn (a client re-submitting history) and an empty
/// turn are both recorded as nothing rather than rejected.
async fn record_user_turn(
    state: &AppState,
    chat: &ChatRecord,
    messages: &[Turn],
) -> Result<(), ServerError> {
    let Some(last) = messages.last() else {
        return Ok(());
    };
    if !last.role.eq_ignore_ascii_case("user") {
        return Ok(());
    }
    let text = last.text();
    if text.is_empty() {
        return Ok(());
    }
    state
        .store
        .append_message(MessageRecord {
            id: Uuid::new_v4().to_string(),
            chat_id: chat.id.clone(),
            role: "USER".to_owned(),
            content: text.clone(),
            created_at: Utc::now(),
        })
        .await?;
    if state.store.count_messages(&chat.id).await? <= 1 {
        state
            .store
            .set_chat_title(&chat.id, &derive_title(&text))
            .await?;
    }
    Ok(())
}

/// First [`TITLE_MAX_CHARS`] characters of the opening prompt, with an
/// ellipsis when truncated.
fn derive_title(text: &str) -> String {
    let mut chars = text.chars();
    let title: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{title}...")
    } else {
        title
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use super::derive_title;
    use crate::entities::ChatStore;
    use crate::routes;
    use crate::test_support::{
        bearer, json_body, post_json, seed_chat, seed_user, state_with_backend, text_body,
    };

    /// Serve a fixed (status, body) for `POST /graph/chat/stream` on an
    /// ephemeral port, counting hits.
    async fn scripted_backend(
        status: StatusCode,
        body: &'static str,
    ) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = axum::Router::new().route(
            "/graph/chat/stream",
            axum::routing::post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (status, body)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), hits)
    }

    #[tokio::test]
    async fn relay_streams_frames_and_persists_both_turns() {
        let (url, _) = scripted_backend(
            StatusCode::OK,
            "data: {\"content\": \"Hel\"}\n\ndata: {\"content\": \"lo\"}\n\n",
        )
        .await;
        let state = state_with_backend(&url).await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        let chat = seed_chat(&state, &user).await;
        let token = bearer(&state, &user);
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(post_json(
                "/api/chat",
                Some(&token),
                &json!({
                    "messages": [{"role": "user", "content": "Why is the panel dark?"}],
                    "chatId": chat.id,
                }),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = text_body(resp).await;
        assert_eq!(body, "0:\"Hel\"\n0:\"lo\"\n");

        // Body EOF means the relay task has finished persisting.
        let messages = state.store.list_messages(&chat.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "USER");
        assert_eq!(messages[0].content, "Why is the panel dark?");
        assert_eq!(messages[1].role, "ASSISTANT");
        assert_eq!(messages[1].content, "Hello");
    }

    #[tokio::test]
    async fn first_user_turn_titles_the_chat_and_later_turns_do_not() {
        let (url, _) =
            scripted_backend(StatusCode::OK, "data: {\"content\": \"ok\"}\n\n").await;
        let state = state_with_backend(&url).await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        let chat = seed_chat(&state, &user).await;
        let token = bearer(&state, &user);
        let app = routes::build(state.clone());

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/chat",
                Some(&token),
                &json!({
                    "messages": [{"role": "user", "content": "First question"}],
                    "chatId": chat.id,
                }),
            ))
            .await
            .unwrap();
        text_body(resp).await;
        let titled = state.store.get_chat(&chat.id, &user.id).await.unwrap().unwrap();
        assert_eq!(titled.title, "First question");

        let resp = app
            .oneshot(post_json(
                "/api/chat",
                Some(&token),
                &json!({
                    "messages": [
                        {"role": "user", "content": "First question"},
                        {"role": "assistant", "content": "ok"},
                        {"role": "user", "content": "Second question"},
                    ],
                    "chatId": chat.id,
                }),
            ))
            .await
            .unwrap();
        text_body(resp).await;
        let after = state.store.get_chat(&chat.id, &user.id).await.unwrap().unwrap();
        assert_eq!(after.title, "First question");
    }

    #[tokio::test]
    async fn unauthenticated_call_reaches_neither_backend_nor_store() {
        let (url, hits) =
            scripted_backend(StatusCode::OK, "data: {\"content\": \"ok\"}\n\n").await;
        let state = state_with_backend(&url).await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        let chat = seed_chat(&state, &user).await;
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(post_json(
                "/api/chat",
                None,
                &json!({
                    "messages": [{"role": "user", "content": "hi"}],
                    "chatId": chat.id,
                }),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(state.store.list_messages(&chat.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_owned_by_someone_else_is_not_found() {
        let (url, hits) =
            scripted_backend(StatusCode::OK, "data: {\"content\": \"ok\"}\n\n").await;
        let state = state_with_backend(&url).await;
        let owner = seed_user(&state, "owner@example.com", "pw", "USER").await;
        let other = seed_user(&state, "other@example.com", "pw", "USER").await;
        let chat = seed_chat(&state, &owner).await;
        let token = bearer(&state, &other);
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(post_json(
                "/api/chat",
                Some(&token),
                &json!({
                    "messages": [{"role": "user", "content": "hi"}],
                    "chatId": chat.id,
                }),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(state.store.list_messages(&chat.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn backend_refusal_maps_to_502_with_user_turn_already_recorded() {
        let (url, hits) =
            scripted_backend(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
        let state = state_with_backend(&url).await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        let chat = seed_chat(&state, &user).await;
        let token = bearer(&state, &user);
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(post_json(
                "/api/chat",
                Some(&token),
                &json!({
                    "messages": [{"role": "user", "content": "hi"}],
                    "chatId": chat.id,
                }),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        let messages = state.store.list_messages(&chat.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "USER");
    }

    #[tokio::test]
    async fn empty_message_list_is_rejected_before_the_backend_call() {
        let (url, hits) =
            scripted_backend(StatusCode::OK, "data: {\"content\": \"ok\"}\n\n").await;
        let state = state_with_backend(&url).await;
        let user = seed_user(&state, "kim@example.com", "pw", "USER").await;
        let token = bearer(&state, &user);
        let app = routes::build(state.clone());

        let resp = app
            .oneshot(post_json(
                "/api/chat",
                Some(&token),
                &json!({"messages": []}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "messages must not be empty");
    }

    #[test]
    fn derive_title_truncates_to_fifty_characters() {
        let exact: String = "x".repeat(50);
        assert_eq!(derive_title(&exact), exact);
        let long: String = "x".repeat(51);
        assert_eq!(derive_title(&long), format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn derive_title_counts_characters_not_bytes() {
        let text = "결".repeat(50);
        assert_eq!(derive_title(&text), text);
        let longer = "결".repeat(51);
        assert_eq!(derive_title(&longer), format!("{}...", "결".repeat(50)));
    }
}
