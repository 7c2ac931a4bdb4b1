//! Request shape for the streaming chat relay.
//!
//! Browser clients send turns in one of two shapes: a flat `content` string,
//! or a `parts` array of typed fragments (only `"text"` parts carry prose).
//! [`Turn::text`] collapses both to plain text before anything is forwarded
//! or persisted.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRelayRequest {
    pub messages: Vec<Turn>,
    /// Model identifier; the configured default is used when omitted.
    #[serde(default)]
    pub model: Option<String>,
    /// Enables transcript persistence when present.
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Relay backend progress events as `d:` frames.
    #[serde(default)]
    pub debug: Option<bool>,
}

/// One conversation turn as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Turn {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<TurnPart>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TurnPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Turn {
    /// Effective text of the turn: `content` when non-empty, otherwise the
    /// concatenation of every `"text"` part in array order, otherwise `""`.
    pub fn text(&self) -> String {
        if let Some(content) = &self.content {
            if !content.is_empty() {
                return content.clone();
            }
        }
        match &self.parts {
            Some(parts) => parts
                .iter()
                .filter(|p| p.kind == "text")
                .filter_map(|p| p.text.as_deref())
                .collect(),
            None => String::new(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
