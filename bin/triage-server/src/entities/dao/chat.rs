use chrono::{DateTime, Utc};

/// A single row in the `chats` table.
#[derive(Debug, Clone)]
pub struct ChatRecord {
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub model_name: String,
    pub group_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single row in the `messages` table.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub id: String,
    pub chat_id: String,
    /// `"USER"`, `"ASSISTANT"`, or `"SYSTEM"`.
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A single row in the `chat_groups` table (per-user chat folders).
#[derive(Debug, Clone)]
pub struct ChatGroupRecord {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub parent_id: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
