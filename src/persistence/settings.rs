//! Key/value settings persistence.
//!
//! Each key holds one JSON document that is replaced as a whole on write.

use crate::error::{BoardError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::SqlitePool;

/// Reads the raw text stored under `key`.
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(|e| BoardError::persistence(format!("Failed to read setting '{key}': {e}")))?;

    Ok(row.map(|(v,)| v))
}

/// Stores `value` under `key`, replacing any previous value.
pub async fn put_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, datetime('now'))
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await
    .map_err(|e| BoardError::persistence(format!("Failed to write setting '{key}': {e}")))?;

    Ok(())
}

/// Reads and decodes the JSON document stored under `key`.
pub async fn get_json<T: DeserializeOwned>(pool: &SqlitePool, key: &str) -> Result<Option<T>> {
    match get_setting(pool, key).await? {
        Some(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
            BoardError::persistence(format!("Stored setting '{key}' is not valid: {e}"))
        }),
        None => Ok(None),
    }
}

/// Encodes `value` as JSON and stores it under `key`.
pub async fn put_json<T: Serialize + ?Sized>(pool: &SqlitePool, key: &str, value: &T) -> Result<()> {
    let text = serde_json::to_string(value)
        .map_err(|e| BoardError::persistence(format!("Failed to encode setting '{key}': {e}")))?;
    put_setting(pool, key, &text).await
}
