use anyhow::Result;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::db::{get_item, set_item};
use crate::models::Settings;

pub const SETTINGS_KEY: &str = "score_predictor_settings";

/// Observable settings record. Readers load the whole record on every call,
/// so nothing is cached between reads.
#[derive(Clone)]
pub struct SettingsStore {
    pool: SqlitePool,
    changes: broadcast::Sender<Settings>,
}

impl SettingsStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self { pool, changes }
    }

    /// Persisted settings, or the defaults when absent, unreadable or corrupt.
    pub async fn get(&self) -> Settings {
        let saved = match get_item(&self.pool, SETTINGS_KEY).await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::error!("Failed to read settings: {}", e);
                None
            }
        };

        match saved {
            None => Settings::default(),
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings: {}", e);
                Settings::default()
            }),
        }
    }

    /// Overwrite the persisted record and notify subscribers.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        let raw = serde_json::to_string(settings)?;
        set_item(&self.pool, SETTINGS_KEY, &raw).await?;
        tracing::info!("Settings saved (provider {}, language {})", settings.ai_provider, settings.language);

        // No subscribers is fine.
        let _ = self.changes.send(settings.clone());
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Settings> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::models::{AiProvider, Language};

    #[tokio::test]
    async fn absent_record_yields_defaults() {
        let store = SettingsStore::new(create_memory_pool().await.unwrap());
        assert_eq!(store.get().await, Settings::default());
    }

    #[tokio::test]
    async fn corrupt_record_yields_defaults() {
        let pool = create_memory_pool().await.unwrap();
        set_item(&pool, SETTINGS_KEY, "{not json").await.unwrap();

        let store = SettingsStore::new(pool);
        assert_eq!(store.get().await, Settings::default());
    }

    #[tokio::test]
    async fn save_overwrites_and_notifies() {
        let store = SettingsStore::new(create_memory_pool().await.unwrap());
        let mut changes = store.subscribe();

        let first = Settings {
            ai_api_key: "sk-1".to_string(),
            ai_provider: AiProvider::OpenAi,
            ..Settings::default()
        };
        store.save(&first).await.unwrap();

        let second = Settings {
            football_api_key: "fd".to_string(),
            language: Language::Id,
            ..Settings::default()
        };
        store.save(&second).await.unwrap();

        assert_eq!(store.get().await, second);
        assert_eq!(changes.recv().await.unwrap(), first);
        assert_eq!(changes.recv().await.unwrap(), second);
    }

    #[tokio::test]
    async fn persisted_record_uses_original_field_names() {
        let pool = create_memory_pool().await.unwrap();
        set_item(
            &pool,
            SETTINGS_KEY,
            r#"{"footballApiKey":"fd","aiApiKey":"","aiProvider":"openai-compatible","aiBaseUrl":"http://localhost:11434/v1","aiModel":"llama3","language":"id"}"#,
        )
        .await
        .unwrap();

        let settings = SettingsStore::new(pool).get().await;
        assert_eq!(settings.ai_provider, AiProvider::OpenAiCompatible);
        assert_eq!(settings.model_override(), Some("llama3"));
        assert_eq!(settings.language, Language::Id);
    }
}
