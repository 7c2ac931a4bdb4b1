use std::future::Future;

use crate::entities::{ChatRecord, MessageRecord, SqliteStore, parse_stored_ts};

pub trait ChatStore: Send + Sync + 'static {
    fn create_chat(&self, chat: ChatRecord) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Fetch a chat only if it belongs to `user_id`.
    fn get_chat(
        &self,
        id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<ChatRecord>, sqlx::Error>> + Send;
    fn list_chats(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<ChatRecord>, sqlx::Error>> + Send;
    fn update_chat(
        &self,
        chat: &ChatRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn set_chat_title(
        &self,
        id: &str,
        title: &str,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_chat(
        &self,
        id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;

    fn append_message(
        &self,
        msg: MessageRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn list_messages(
        &self,
        chat_id: &str,
    ) -> impl Future<Output = Result<Vec<MessageRecord>, sqlx::Error>> + Send;
    fn count_messages(&self, chat_id: &str)
    -> impl Future<Output = Result<i64, sqlx::Error>> + Send;
}

impl ChatStore for SqliteStore {
    async fn create_chat(&self, chat: ChatRecord) -> Result<(), sqlx::Error> {
        let created_at = chat.created_at.to_rfc3339();
        let updated_at = chat.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO chats (id, title, user_id, model_name, group_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&chat.id)
        .bind(&chat.title)
        .bind(&chat.user_id)
        .bind(&chat.model_name)
        .bind(&chat.group_id)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_chat(&self, id: &str, user_id: &str) -> Result<Option<ChatRecord>, sqlx::Error> {
        let row: Option<(String, String, String, String, Option<String>, String, String)> =
            sqlx::query_as(
                "SELECT id, title, user_id, model_name, group_id, created_at, updated_at \
                 FROM chats WHERE id = ?1 AND user_id = ?2",
            )
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(chat_from_row))
    }

    async fn list_chats(&self, user_id: &str) -> Result<Vec<ChatRecord>, sqlx::Error> {
        let rows: Vec<(String, String, String, String, Option<String>, String, String)> =
            sqlx::query_as(
                "SELECT id, title, user_id, model_name, group_id, created_at, updated_at \
                 FROM chats WHERE user_id = ?1 ORDER BY updated_at DESC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(chat_from_row).collect())
    }

    async fn update_chat(&self, chat: &ChatRecord) -> Result<(), sqlx::Error> {
        let updated_at = chat.updated_at.to_rfc3339();
        sqlx::query(
            "UPDATE chats SET title = ?1, model_name = ?2, group_id = ?3, updated_at = ?4 \
             WHERE id = ?5 AND user_id = ?6",
        )
        .bind(&chat.title)
        .bind(&chat.model_name)
        .bind(&chat.group_id)
        .bind(&updated_at)
        .bind(&chat.id)
        .bind(&chat.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_chat_title(&self, id: &str, title: &str) -> Result<(), sqlx::Error> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        sqlx::query("UPDATE chats SET title = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(title)
            .bind(&updated_at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_chat(&self, id: &str, user_id: &str) -> Result<u64, sqlx::Error> {
        // Messages go with the chat via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM chats WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn append_message(&self, msg: MessageRecord) -> Result<(), sqlx::Error> {
        let created_at = msg.created_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO messages (id, chat_id, role, content, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&msg.id)
        .bind(&msg.chat_id)
        .bind(&msg.role)
        .bind(&msg.content)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        // Bump chat recency so listings sort by latest activity.
        sqlx::query("UPDATE chats SET updated_at = ?1 WHERE id = ?2")
            .bind(&created_at)
            .bind(&msg.chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<MessageRecord>, sqlx::Error> {
        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
            "SELECT id, chat_id, role, content, created_at \
             FROM messages WHERE chat_id = ?1 ORDER BY created_at ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, chat_id, role, content, created_at)| MessageRecord {
                id,
                chat_id,
                role,
                content,
                created_at: parse_stored_ts(&created_at, "messages.created_at"),
            })
            .collect())
    }

    async fn count_messages(&self, chat_id: &str) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE chat_id = ?1")
            .bind(chat_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

fn chat_from_row(
    (id, title, user_id, model_name, group_id, created_at, updated_at): (
        String,
        String,
        String,
        String,
        Option<String>,
        String,
        String,
    ),
) -> ChatRecord {
    ChatRecord {
        id,
        title,
        user_id,
        model_name,
        group_id,
        created_at: parse_stored_ts(&created_at, "chats.created_at"),
        updated_at: parse_stored_ts(&updated_at, "chats.updated_at"),
    }
}
