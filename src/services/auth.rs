use anyhow::Result;
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::db::{get_item, remove_item, set_item};
use crate::models::User;

pub const USER_KEY: &str = "score_predictor_user";

/// Mock sign-in. Any email/password pair succeeds; nothing is verified or secured.
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
    login_delay: Duration,
    changes: broadcast::Sender<Option<User>>,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            pool,
            login_delay: Duration::from_secs(1),
            changes,
        }
    }

    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    pub async fn login(&self, email: &str, _password: &str) -> Result<User> {
        // Simulated round trip
        tokio::time::sleep(self.login_delay).await;

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: "John Doe".to_string(),
            email: email.to_string(),
            avatar: "https://api.dicebear.com/7.x/avataaars/svg?seed=John".to_string(),
        };

        set_item(&self.pool, USER_KEY, &serde_json::to_string(&user)?).await?;
        tracing::info!("Signed in as {}", user.email);
        let _ = self.changes.send(Some(user.clone()));
        Ok(user)
    }

    pub async fn logout(&self) -> Result<()> {
        remove_item(&self.pool, USER_KEY).await?;
        let _ = self.changes.send(None);
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        let raw = get_item(&self.pool, USER_KEY).await.ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Failed to parse user data: {}", e);
                None
            }
        }
    }

    /// True whenever a session record exists, even one that no longer parses.
    pub async fn is_authenticated(&self) -> bool {
        matches!(get_item(&self.pool, USER_KEY).await, Ok(Some(_)))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Option<User>> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    async fn store() -> SessionStore {
        SessionStore::new(create_memory_pool().await.unwrap()).with_login_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn login_persists_mock_user() {
        let sessions = store().await;
        let mut changes = sessions.subscribe();
        assert!(!sessions.is_authenticated().await);

        let user = sessions.login("fan@example.com", "hunter2").await.unwrap();
        assert_eq!(user.name, "John Doe");
        assert_eq!(user.email, "fan@example.com");

        assert!(sessions.is_authenticated().await);
        assert_eq!(sessions.current_user().await, Some(user.clone()));
        assert_eq!(changes.recv().await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let sessions = store().await;
        sessions.login("fan@example.com", "").await.unwrap();
        sessions.logout().await.unwrap();

        assert!(!sessions.is_authenticated().await);
        assert_eq!(sessions.current_user().await, None);
    }

    #[tokio::test]
    async fn corrupt_session_reads_as_signed_out_user() {
        let pool = create_memory_pool().await.unwrap();
        set_item(&pool, USER_KEY, "][").await.unwrap();

        let sessions = SessionStore::new(pool);
        assert_eq!(sessions.current_user().await, None);
        assert!(sessions.is_authenticated().await);
    }
}
