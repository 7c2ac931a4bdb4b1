use std::future::Future;

use crate::entities::{ChatGroupRecord, SqliteStore, parse_stored_ts};

pub trait GroupStore: Send + Sync + 'static {
    fn create_chat_group(
        &self,
        group: ChatGroupRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Fetch a chat group only if it belongs to `user_id`.
    fn get_chat_group(
        &self,
        id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<ChatGroupRecord>, sqlx::Error>> + Send;
    fn list_chat_groups(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<ChatGroupRecord>, sqlx::Error>> + Send;
    fn update_chat_group(
        &self,
        group: &ChatGroupRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_chat_group(
        &self,
        id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
    fn list_group_chat_ids(
        &self,
        group_id: &str,
    ) -> impl Future<Output = Result<Vec<String>, sqlx::Error>> + Send;
}

impl GroupStore for SqliteStore {
    async fn create_chat_group(&self, group: ChatGroupRecord) -> Result<(), sqlx::Error> {
        let created_at = group.created_at.to_rfc3339();
        let updated_at = group.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO chat_groups (id, name, user_id, parent_id, color, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&group.id)
        .bind(&group.name)
        .bind(&group.user_id)
        .bind(&group.parent_id)
        .bind(&group.color)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_chat_group(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<ChatGroupRecord>, sqlx::Error> {
        let row: Option<(String, String, String, Option<String>, Option<String>, String, String)> =
            sqlx::query_as(
                "SELECT id, name, user_id, parent_id, color, created_at, updated_at \
                 FROM chat_groups WHERE id = ?1 AND user_id = ?2",
            )
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(chat_group_from_row))
    }

    async fn list_chat_groups(&self, user_id: &str) -> Result<Vec<ChatGroupRecord>, sqlx::Error> {
        let rows: Vec<(String, String, String, Option<String>, Option<String>, String, String)> =
            sqlx::query_as(
                "SELECT id, name, user_id, parent_id, color, created_at, updated_at \
                 FROM chat_groups WHERE user_id = ?1 ORDER BY created_at ASC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(chat_group_from_row).collect())
    }

    async fn update_chat_group(&self, group: &ChatGroupRecord) -> Result<(), sqlx::Error> {
        let updated_at = group.updated_at.to_rfc3339();
        sqlx::query(
            "UPDATE chat_groups SET name = ?1, parent_id = ?2, color = ?3, updated_at = ?4 \
             WHERE id = ?5 AND user_id = ?6",
        )
        .bind(&group.name)
        .bind(&group.parent_id)
        .bind(&group.color)
        .bind(&updated_at)
        .bind(&group.id)
        .bind(&group.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_chat_group(&self, id: &str, user_id: &str) -> Result<u64, sqlx::Error> {
        // Child groups are promoted to roots and chats in the group fall
        // back to ungrouped, both via SET NULL in the schema.
        let result = sqlx::query("DELETE FROM chat_groups WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_group_chat_ids(&self, group_id: &str) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM chats WHERE group_id = ?1 ORDER BY updated_at DESC",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

fn chat_group_from_row(
    (id, name, user_id, parent_id, color, created_at, updated_at): (
        String,
        String,
        String,
        Option<String>,
        Option<String>,
        String,
        String,
    ),
) -> ChatGroupRecord {
    ChatGroupRecord {
        id,
        name,
        user_id,
        parent_id,
        color,
        created_at: parse_stored_ts(&created_at, "chat_groups.created_at"),
        updated_at: parse_stored_ts(&updated_at, "chat_groups.updated_at"),
    }
}
