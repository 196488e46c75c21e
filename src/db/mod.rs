pub mod seed;
pub use seed::mock_matches;

use anyhow::Result;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::env;
use std::str::FromStr;

/// Key/value records owned by the application, the CLI analogue of browser local storage.
pub async fn create_pool() -> Result<SqlitePool> {
    let database_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:data/score_predictor.db".to_string());

    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(&database_url);

    if let Some(parent) = std::path::Path::new(file_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
    }

    let options = SqliteConnectOptions::from_str(&database_url)?
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;
    init_database_with_pool(&pool).await?;
    Ok(pool)
}

/// Called from the CLI where no pool exists yet.
pub async fn init_database() -> Result<()> {
    create_pool().await?;
    Ok(())
}

pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS local_storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("Local storage schema ready");
    Ok(())
}

pub async fn get_item(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM local_storage WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

/// Replaces the whole record in a single statement.
pub async fn set_item(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO local_storage (key, value, updated_at) VALUES (?, ?, ?)")
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn remove_item(pool: &SqlitePool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM local_storage WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}

/// Single-connection in-memory pool; every connection to `sqlite::memory:` is its own database.
#[cfg(test)]
pub async fn create_memory_pool() -> Result<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_database_with_pool(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn items_are_overwritten_and_removed() {
        let pool = create_memory_pool().await.unwrap();

        assert_eq!(get_item(&pool, "k").await.unwrap(), None);

        set_item(&pool, "k", "one").await.unwrap();
        set_item(&pool, "k", "two").await.unwrap();
        assert_eq!(get_item(&pool, "k").await.unwrap().as_deref(), Some("two"));

        remove_item(&pool, "k").await.unwrap();
        assert_eq!(get_item(&pool, "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn schema_creation_is_idempotent() {
        let pool = create_memory_pool().await.unwrap();
        init_database_with_pool(&pool).await.unwrap();
        set_item(&pool, "k", "v").await.unwrap();
        init_database_with_pool(&pool).await.unwrap();
        assert_eq!(get_item(&pool, "k").await.unwrap().as_deref(), Some("v"));
    }
}
