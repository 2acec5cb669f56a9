//! Forward-only schema migrations for the state database.
//!
//! Each migration runs in its own transaction together with the row that
//! records it, so a crash never leaves a half-applied version behind.

use crate::error::{BoardError, Result};
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

/// A numbered schema step.
struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "key/value document store",
    sql: r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
    "#,
}];

fn latest_version() -> i32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

fn migration_error(context: &str, e: sqlx::Error) -> BoardError {
    BoardError::persistence(format!("{context}: {e}"))
}

/// Brings the schema up to the latest version.
///
/// A database written by a newer release is refused rather than guessed at.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_versions (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| migration_error("Failed to create schema_versions table", e))?;

    let current = schema_version(pool).await?;
    let latest = latest_version();
    if current > latest {
        return Err(BoardError::persistence(format!(
            "State database schema version ({current}) is newer than supported version ({latest}). \
             Please upgrade glance-board."
        )));
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(pool, migration).await?;
        info!(
            "Applied state migration v{} ({})",
            migration.version, migration.description
        );
    }
    debug!("State database at schema v{}", latest);
    Ok(())
}

async fn schema_version(pool: &SqlitePool) -> Result<i32> {
    let (version,): (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM schema_versions")
        .fetch_one(pool)
        .await
        .map_err(|e| migration_error("Failed to read schema version", e))?;
    Ok(version.unwrap_or(0))
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| migration_error("Failed to start migration", e))?;

    sqlx::query(migration.sql)
        .execute(&mut *tx)
        .await
        .map_err(|e| migration_error(&format!("Migration v{} failed", migration.version), e))?;
    sqlx::query("INSERT INTO schema_versions (version) VALUES (?)")
        .bind(migration.version)
        .execute(&mut *tx)
        .await
        .map_err(|e| migration_error("Failed to record migration", e))?;

    tx.commit()
        .await
        .map_err(|e| migration_error("Failed to commit migration", e))
}
