use std::future::Future;

use crate::entities::{ModelConfigRecord, SqliteStore};

const MODEL_COLUMNS: &str = "id, name, display_name, provider, endpoint, api_key, is_active, \
                             is_default, temperature, max_tokens, system_prompt, created_at, \
                             updated_at";

pub trait ConfigStore: Send + Sync + 'static {
    fn create_model_config(
        &self,
        config: ModelConfigRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_model_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<ModelConfigRecord>, sqlx::Error>> + Send;
    fn get_model_config_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<ModelConfigRecord>, sqlx::Error>> + Send;
    fn list_model_configs(
        &self,
    ) -> impl Future<Output = Result<Vec<ModelConfigRecord>, sqlx::Error>> + Send;
    fn list_active_model_configs(
        &self,
    ) -> impl Future<Output = Result<Vec<ModelConfigRecord>, sqlx::Error>> + Send;
    fn update_model_config(
        &self,
        config: &ModelConfigRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_model_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
    /// Clear `is_default` on every model config, ahead of electing a new one.
    fn clear_default_model_flags(&self)
    -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    fn get_setting(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, sqlx::Error>> + Send;
    fn upsert_setting(
        &self,
        key: &str,
        value: &str,
        category: &str,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// `(key, value, category)` triples, optionally narrowed to one category.
    fn list_settings(
        &self,
        category: Option<&str>,
    ) -> impl Future<Output = Result<Vec<(String, String, String)>, sqlx::Error>> + Send;
}

impl ConfigStore for SqliteStore {
    async fn create_model_config(&self, config: ModelConfigRecord) -> Result<(), sqlx::Error> {
        let created_at = config.created_at.to_rfc3339();
        let updated_at = config.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO model_configs \
             (id, name, display_name, provider, endpoint, api_key, is_active, is_default, \
              temperature, max_tokens, system_prompt, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&config.id)
        .bind(&config.name)
        .bind(&config.display_name)
        .bind(&config.provider)
        .bind(&config.endpoint)
        .bind(&config.api_key)
        .bind(config.is_active)
        .bind(config.is_default)
        .bind(config.temperature)
        .bind(config.max_tokens)
        .bind(&config.system_prompt)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_model_config(&self, id: &str) -> Result<Option<ModelConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {MODEL_COLUMNS} FROM model_configs WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_model_config_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ModelConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {MODEL_COLUMNS} FROM model_configs WHERE name = ?1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_model_configs(&self) -> Result<Vec<ModelConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {MODEL_COLUMNS} FROM model_configs ORDER BY is_default DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn list_active_model_configs(&self) -> Result<Vec<ModelConfigRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {MODEL_COLUMNS} FROM model_configs WHERE is_active = 1 \
             ORDER BY is_default DESC, display_name ASC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn update_model_config(&self, config: &ModelConfigRecord) -> Result<(), sqlx::Error> {
        let updated_at = config.updated_at.to_rfc3339();
        sqlx::query(
            "UPDATE model_configs SET name = ?1, display_name = ?2, provider = ?3, \
             endpoint = ?4, api_key = ?5, is_active = ?6, is_default = ?7, temperature = ?8, \
             max_tokens = ?9, system_prompt = ?10, updated_at = ?11 WHERE id = ?12",
        )
        .bind(&config.name)
        .bind(&config.display_name)
        .bind(&config.provider)
        .bind(&config.endpoint)
        .bind(&config.api_key)
        .bind(config.is_active)
        .bind(config.is_default)
        .bind(config.temperature)
        .bind(config.max_tokens)
        .bind(&config.system_prompt)
        .bind(&updated_at)
        .bind(&config.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_model_config(&self, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM model_configs WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn clear_default_model_flags(&self) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE model_configs SET is_default = 0 WHERE is_default = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM app_settings WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(v,)| v))
    }

    async fn upsert_setting(
        &self,
        key: &str,
        value: &str,
        category: &str,
    ) -> Result<(), sqlx::Error> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO app_settings (key, value, category, updated_at) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(key) DO UPDATE SET value = ?2, category = ?3, updated_at = ?4",
        )
        .bind(key)
        .bind(value)
        .bind(category)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_settings(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<(String, String, String)>, sqlx::Error> {
        let rows: Vec<(String, String, String)> = if let Some(cat) = category {
            sqlx::query_as(
                "SELECT key, value, category FROM app_settings WHERE category = ?1 ORDER BY key",
            )
            .bind(cat)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as("SELECT key, value, category FROM app_settings ORDER BY key")
                .fetch_all(&self.pool)
                .await?
        };
        Ok(rows)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;

    fn config(id: &str, name: &str, is_default: bool) -> ModelConfigRecord {
        ModelConfigRecord {
            id: id.to_string(),
            name: name.to_string(),
            display_name: name.to_string(),
            provider: "OLLAMA".to_string(),
            endpoint: None,
            api_key: None,
            is_active: true,
            is_default,
            temperature: 0.7,
            max_tokens: 4096,
            system_prompt: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn default_flag_moves_to_the_elected_config() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        store
            .create_model_config(config("m1", "qwen3:32b", true))
            .await
            .unwrap();
        store
            .create_model_config(config("m2", "llama3.1:8b", false))
            .await
            .unwrap();

        store.clear_default_model_flags().await.unwrap();
        let mut next = store.get_model_config("m2").await.unwrap().unwrap();
        next.is_default = true;
        next.updated_at = Utc::now();
        store.update_model_config(&next).await.unwrap();

        let old = store.get_model_config("m1").await.unwrap().unwrap();
        assert!(!old.is_default);
        let new = store.get_model_config("m2").await.unwrap().unwrap();
        assert!(new.is_default);
    }

    #[tokio::test]
    async fn settings_upsert_overwrites_in_place() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        store
            .upsert_setting("llm.defaultModel", "qwen3:32b", "llm")
            .await
            .unwrap();
        store
            .upsert_setting("llm.defaultModel", "llama3.1:8b", "llm")
            .await
            .unwrap();

        assert_eq!(
            store.get_setting("llm.defaultModel").await.unwrap().as_deref(),
            Some("llama3.1:8b")
        );
        assert_eq!(store.list_settings(Some("llm")).await.unwrap().len(), 1);
        assert!(store.list_settings(Some("rag")).await.unwrap().is_empty());
    }
}
