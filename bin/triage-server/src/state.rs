//! Shared application state injected into every Axum handler.

use std::collections::HashMap;
use std::sync::Arc;

use triage_collect::{CollectSession, Dataset};

use crate::auth::TokenKeys;
use crate::config::Config;
use crate::entities::SqliteStore;
use crate::upstream::GraphClient;

/// In-memory registry of running data-collection sessions, keyed by session
/// ID.  Sessions live only as long as the process; the outcome that matters
/// (the rendered context document) ends up in the chat history.
pub struct CollectSessions {
    sessions: std::sync::Mutex<HashMap<String, CollectSession>>,
}

impl std::fmt::Debug for CollectSessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.sessions.lock().map(|s| s.len()).unwrap_or(0);
        write!(f, "CollectSessions({count} active)")
    }
}

impl CollectSessions {
    pub fn new() -> Self {
        Self { sessions: std::sync::Mutex::new(HashMap::new()) }
    }

    pub fn insert(&self, id: impl Into<String>, session: CollectSession) {
        if let Ok(mut map) = self.sessions.lock() {
            map.insert(id.into(), session);
        }
    }

    /// Run `f` against the session, if present.
    pub fn with<R>(&self, id: &str, f: impl FnOnce(&mut CollectSession) -> R) -> Option<R> {
        match self.sessions.lock() {
            Ok(mut map) => map.get_mut(id).map(f),
            Err(_) => None,
        }
    }

    /// Drop a session.  Returns `true` if it existed.
    pub fn remove(&self, id: &str) -> bool {
        match self.sessions.lock() {
            Ok(mut map) => map.remove(id).is_some(),
            Err(_) => false,
        }
    }
}

impl Default for CollectSessions {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Persistent store for users, chats, cases and configs.
    pub store: Arc<SqliteStore>,
    /// Token signing / validation keys.
    pub keys: TokenKeys,
    /// HTTP client for the inference backend.
    pub graph: GraphClient,
    /// Running data-collection sessions.
    pub collect: Arc<CollectSessions>,
    /// Reference data served to collection sessions.
    pub dataset: Arc<Dataset>,
}
