//! HTTP client for the inference backend (the "graph" service).
//!
//! The backend owns all LLM access; this server only forwards chat turns to
//! `POST {base}/graph/chat/stream` and relays the token stream back to the
//! browser.  See [`crate::relay`] for the stream handling.

use serde::Serialize;

use crate::error::ServerError;

/// One turn of conversation as the backend expects it.
#[derive(Debug, Clone, Serialize)]
pub struct GraphMessage {
    pub role: String,
    pub content: String,
}

/// Body for `POST /graph/chat/stream`.
#[derive(Debug, Clone, Serialize)]
pub struct GraphChatRequest {
    pub messages: Vec<GraphMessage>,
    pub model: String,
    pub debug: bool,
}

#[derive(Clone, Debug)]
pub struct GraphClient {
    base_url: String,
    client: reqwest::Client,
}

impl GraphClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("triage-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Send a chat turn and hand back the still-streaming response.
    ///
    /// A non-success status is turned into [`ServerError::Upstream`] here,
    /// before any stream bytes reach the caller, so the handler can still
    /// answer with a proper HTTP error instead of a broken stream.
    pub async fn chat_stream(
        &self,
        request: &GraphChatRequest,
    ) -> Result<reqwest::Response, ServerError> {
        let url = format!("{}/graph/chat/stream", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ServerError::Upstream(format!("request to {url} failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ServerError::Upstream(format!(
                "{url} returned {status}: {body}"
            )));
        }
        Ok(resp)
    }

    /// Fetch the backend's self-description (`GET /graph/info`), passed
    /// through to the frontend unmodified.
    pub async fn graph_info(&self) -> Result<serde_json::Value, ServerError> {
        self.get_json(&format!("{}/graph/info", self.base_url)).await
    }

    /// Model catalogue served by the backend (`GET /api/models`), passed
    /// through to the frontend unmodified.
    pub async fn backend_models(&self) -> Result<serde_json::Value, ServerError> {
        self.get_json(&format!("{}/api/models", self.base_url)).await
    }

    /// Locally installed models from an Ollama daemon (`GET {host}/api/tags`).
    ///
    /// An unreachable daemon is not an error; the model picker simply lists
    /// none.
    pub async fn ollama_models(&self, host: &str) -> Vec<serde_json::Value> {
        let url = format!("{}/api/tags", host.trim_end_matches('/'));
        let value: serde_json::Value = match self.get_json(&url).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "could not list ollama models");
                return Vec::new();
            }
        };
        value
            .get("models")
            .and_then(|models| models.as_array())
            .cloned()
            .unwrap_or_default()
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, ServerError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ServerError::Upstream(format!("request to {url} failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ServerError::Upstream(format!("{url} returned {status}")));
        }
        resp.json()
            .await
            .map_err(|e| ServerError::Upstream(format!("{url} returned invalid JSON: {e}")))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = GraphClient::new("http://localhost:8000/");
        assert_eq!(client.base_url, "http://localhost:8000");
        let client = GraphClient::new("http://localhost:8000");
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
