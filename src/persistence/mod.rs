//! Persistence layer for glance-board.
//!
//! Manages local SQLite storage for dashboards and the recent-databases list.
//! Both are stored as whole JSON documents: every save replaces the entire
//! collection, there are no partial writes.

mod memory;
mod migrations;
pub mod settings;

pub use memory::MemorySettingsStore;

use crate::dashboard::Dashboard;
use crate::error::{BoardError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const MAX_RETRY_ATTEMPTS: u32 = 3;
const RETRY_DELAY_MS: u64 = 100;

/// Settings key holding the dashboard collection.
pub const DASHBOARDS_KEY: &str = "dashboards";

/// Settings key holding the recently opened database paths.
pub const RECENT_DATABASES_KEY: &str = "recentDatabases";

/// Whole-collection storage for the documents the application keeps
/// between runs.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Loads all dashboards. A store that never saved any returns an empty list.
    async fn load_dashboards(&self) -> Result<Vec<Dashboard>>;

    /// Replaces the stored dashboard collection.
    async fn save_dashboards(&self, dashboards: &[Dashboard]) -> Result<()>;

    /// Loads the recent database paths, most recent first.
    async fn load_recent_databases(&self) -> Result<Vec<String>>;

    /// Replaces the stored recent database paths.
    async fn save_recent_databases(&self, paths: &[String]) -> Result<()>;
}

/// Main persistence interface for the application state database.
pub struct StateDb {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl StateDb {
    /// Opens or creates the state database at the default platform path.
    ///
    /// - Linux/macOS: `~/.config/glance-board/state.db`
    /// - Windows: `%APPDATA%\glance-board\state.db`
    pub async fn open_default() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open(&path).await
    }

    /// Opens or creates the state database at the specified path.
    pub async fn open(path: &Path) -> Result<Self> {
        Self::ensure_parent_dirs(path)?;

        match Self::try_open(path).await {
            Ok(db) => Ok(db),
            Err(e) => {
                warn!("Failed to open state database: {e}. Attempting recovery...");
                Self::attempt_recovery(path).await
            }
        }
    }

    /// Opens a private in-memory state database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BoardError::persistence(format!("Failed to open state database: {e}")))?;
        migrations::run_migrations(&pool).await?;
        Ok(Self {
            pool,
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Returns the default state database path for the current platform.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BoardError::persistence("Could not determine config directory"))?;
        Ok(config_dir.join("glance-board").join("state.db"))
    }

    /// Attempts to open the database with retries for lock contention.
    async fn try_open(path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * 2u64.pow(attempt)))
                    .await;
            }

            match Self::connect(path).await {
                Ok(pool) => {
                    migrations::run_migrations(&pool).await?;
                    info!("State database opened at {}", path.display());
                    return Ok(Self {
                        pool,
                        db_path: path.to_path_buf(),
                    });
                }
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| BoardError::persistence("Failed to open database after retries")))
    }

    /// Creates a connection pool to the SQLite database.
    async fn connect(path: &Path) -> Result<SqlitePool> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| {
                BoardError::persistence(format!("Failed to connect to state database: {e}"))
            })
    }

    /// Ensures parent directories exist for the database path.
    fn ensure_parent_dirs(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BoardError::persistence(format!(
                    "Failed to create config directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        Ok(())
    }

    /// Attempts to recover from a corrupted database by backing up and recreating.
    async fn attempt_recovery(path: &Path) -> Result<Self> {
        let backup_path = path.with_extension("db.bak");

        if path.exists() {
            std::fs::rename(path, &backup_path).map_err(|e| {
                BoardError::persistence(format!(
                    "Failed to backup corrupted database to {}: {e}",
                    backup_path.display()
                ))
            })?;
            warn!("Backed up corrupted database to {}", backup_path.display());
        }

        Self::try_open(path).await.map_err(|e| {
            BoardError::persistence(format!("Failed to recreate database after backup: {e}"))
        })
    }

    /// Returns the path to the state database.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SettingsStore for StateDb {
    async fn load_dashboards(&self) -> Result<Vec<Dashboard>> {
        Ok(settings::get_json(&self.pool, DASHBOARDS_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn save_dashboards(&self, dashboards: &[Dashboard]) -> Result<()> {
        settings::put_json(&self.pool, DASHBOARDS_KEY, dashboards).await
    }

    async fn load_recent_databases(&self) -> Result<Vec<String>> {
        Ok(settings::get_json(&self.pool, RECENT_DATABASES_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn save_recent_databases(&self, paths: &[String]) -> Result<()> {
        settings::put_json(&self.pool, RECENT_DATABASES_KEY, paths).await
    }
}
