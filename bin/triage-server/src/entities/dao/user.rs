use chrono::{DateTime, Utc};

/// A single row in the `users` table.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    /// Argon2 PHC string; never serialized outwards.
    pub password_hash: String,
    /// `"USER"` or `"ADMIN"`.
    pub role: String,
    /// Deactivated accounts keep their rows but can no longer sign in.
    pub is_active: bool,
    pub group_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.role == "ADMIN"
    }
}

/// A single row in the `user_groups` table.
#[derive(Debug, Clone)]
pub struct UserGroupRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
