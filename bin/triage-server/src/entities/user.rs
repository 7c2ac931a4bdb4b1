use std::future::Future;

use crate::entities::{SqliteStore, UserGroupRecord, UserRecord, parse_stored_ts};

/// Raw tuple shape shared by every `users` select.
type UserRow = (
    String,
    String,
    Option<String>,
    String,
    String,
    i64,
    Option<String>,
    String,
    String,
);

const USER_COLUMNS: &str =
    "id, email, name, password_hash, role, is_active, group_id, created_at, updated_at";

pub trait UserStore: Send + Sync + 'static {
    fn create_user(&self, user: UserRecord) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_user(&self, id: &str)
    -> impl Future<Output = Result<Option<UserRecord>, sqlx::Error>> + Send;
    fn get_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, sqlx::Error>> + Send;
    /// All users, newest first.
    fn list_users(&self) -> impl Future<Output = Result<Vec<UserRecord>, sqlx::Error>> + Send;
    fn list_users_in_group(
        &self,
        group_id: &str,
    ) -> impl Future<Output = Result<Vec<UserRecord>, sqlx::Error>> + Send;
    fn update_user(
        &self,
        user: &UserRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_user(&self, id: &str) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
    fn count_user_chats(&self, user_id: &str)
    -> impl Future<Output = Result<i64, sqlx::Error>> + Send;
    fn count_user_chat_groups(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;

    fn create_user_group(
        &self,
        group: UserGroupRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_user_group(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<UserGroupRecord>, sqlx::Error>> + Send;
    fn list_user_groups(
        &self,
    ) -> impl Future<Output = Result<Vec<UserGroupRecord>, sqlx::Error>> + Send;
    fn update_user_group(
        &self,
        group: &UserGroupRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_user_group(&self, id: &str)
    -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
    fn count_group_members(
        &self,
        group_id: &str,
    ) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;
}

impl UserStore for SqliteStore {
    async fn create_user(&self, user: UserRecord) -> Result<(), sqlx::Error> {
        let created_at = user.created_at.to_rfc3339();
        let updated_at = user.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO users \
             (id, email, name, password_hash, role, is_active, group_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.is_active as i64)
        .bind(&user.group_id)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(user_from_row))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(user_from_row))
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, sqlx::Error> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(user_from_row).collect())
    }

    async fn list_users_in_group(&self, group_id: &str) -> Result<Vec<UserRecord>, sqlx::Error> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE group_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(user_from_row).collect())
    }

    async fn update_user(&self, user: &UserRecord) -> Result<(), sqlx::Error> {
        let updated_at = user.updated_at.to_rfc3339();
        sqlx::query(
            "UPDATE users SET email = ?1, name = ?2, password_hash = ?3, role = ?4, \
             is_active = ?5, group_id = ?6, updated_at = ?7 WHERE id = ?8",
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.is_active as i64)
        .bind(&user.group_id)
        .bind(&updated_at)
        .bind(&user.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_user_chats(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chats WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn count_user_chat_groups(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_groups WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn create_user_group(&self, group: UserGroupRecord) -> Result<(), sqlx::Error> {
        let created_at = group.created_at.to_rfc3339();
        let updated_at = group.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO user_groups (id, name, description, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&group.id)
        .bind(&group.name)
        .bind(&group.description)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user_group(&self, id: &str) -> Result<Option<UserGroupRecord>, sqlx::Error> {
        let row: Option<(String, String, Option<String>, String, String)> = sqlx::query_as(
            "SELECT id, name, description, created_at, updated_at \
             FROM user_groups WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(group_from_row))
    }

    async fn list_user_groups(&self) -> Result<Vec<UserGroupRecord>, sqlx::Error> {
        let rows: Vec<(String, String, Option<String>, String, String)> = sqlx::query_as(
            "SELECT id, name, description, created_at, updated_at \
             FROM user_groups ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(group_from_row).collect())
    }

    async fn update_user_group(&self, group: &UserGroupRecord) -> Result<(), sqlx::Error> {
        let updated_at = group.updated_at.to_rfc3339();
        sqlx::query(
            "UPDATE user_groups SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(&group.name)
        .bind(&group.description)
        .bind(&updated_at)
        .bind(&group.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_user_group(&self, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_groups WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_group_members(&self, group_id: &str) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE group_id = ?1")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

fn user_from_row(
    (id, email, name, password_hash, role, is_active, group_id, created_at, updated_at): UserRow,
) -> UserRecord {
    UserRecord {
        id,
        email,
        name,
        password_hash,
        role,
        is_active: is_active != 0,
        group_id,
        created_at: parse_stored_ts(&created_at, "users.created_at"),
        updated_at: parse_stored_ts(&updated_at, "users.updated_at"),
    }
}

fn group_from_row(
    (id, name, description, created_at, updated_at): (
        String,
        String,
        Option<String>,
        String,
        String,
    ),
) -> UserGroupRecord {
    UserGroupRecord {
        id,
        name,
        description,
        created_at: parse_stored_ts(&created_at, "user_groups.created_at"),
        updated_at: parse_stored_ts(&updated_at, "user_groups.updated_at"),
    }
}
