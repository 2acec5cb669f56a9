//! Connection manager for the currently open database.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::db::{self, DatabaseClient, DatabaseInfo};
use crate::error::{BoardError, Result};
use crate::state::Slot;

/// The open database and where it came from.
#[derive(Clone)]
pub struct ActiveDatabase {
    /// Path the database was opened from.
    pub path: PathBuf,
    /// Database client.
    pub db: Arc<dyn DatabaseClient>,
}

/// Holds at most one open database and hands out its client.
///
/// Everything that talks to the backend (the query executor, the database
/// session) goes through the same manager, so opening another file switches
/// all of them at once.
#[derive(Default)]
pub struct ConnectionManager {
    active: Slot<Option<ActiveDatabase>>,
}

impl ConnectionManager {
    /// Creates a manager with no database open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager with an existing client already open.
    pub fn with_client(path: impl Into<PathBuf>, db: Arc<dyn DatabaseClient>) -> Self {
        let manager = Self::new();
        manager.attach(path, db);
        manager
    }

    /// Opens an existing database file, replacing the current one.
    pub async fn open(&self, path: &Path) -> Result<DatabaseInfo> {
        let db = db::open(path).await?;
        self.activate(path, db).await
    }

    /// Creates a database file (or opens it if it exists), replacing the
    /// current one.
    pub async fn create(&self, path: &Path) -> Result<DatabaseInfo> {
        let db = db::create(path).await?;
        self.activate(path, db).await
    }

    /// Installs `db` as the open database without closing the previous one.
    pub fn attach(&self, path: impl Into<PathBuf>, db: Arc<dyn DatabaseClient>) {
        self.active.set(Some(ActiveDatabase {
            path: path.into(),
            db,
        }));
    }

    async fn activate(&self, path: &Path, db: Arc<dyn DatabaseClient>) -> Result<DatabaseInfo> {
        let tables = db.list_tables().await?;
        let previous = self.active.update(|current| {
            (
                Some(ActiveDatabase {
                    path: path.to_path_buf(),
                    db: db.clone(),
                }),
                current.clone(),
            )
        });

        if let Some(old) = previous {
            if let Err(e) = old.db.close().await {
                warn!("Failed to close {}: {}", old.path.display(), e);
            }
        }
        info!("Opened database {}", path.display());

        Ok(DatabaseInfo {
            path: path.display().to_string(),
            tables: tables.into_iter().map(|t| t.name).collect(),
        })
    }

    /// Returns the open database client.
    pub fn db(&self) -> Result<Arc<dyn DatabaseClient>> {
        self.active
            .get()
            .map(|active| active.db)
            .ok_or_else(|| BoardError::connection("No database selected"))
    }

    /// Path of the open database.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.active.get().map(|active| active.path)
    }

    pub fn is_connected(&self) -> bool {
        self.active.get().is_some()
    }

    /// Subscribes to database switches.
    pub fn subscribe(&self) -> watch::Receiver<Option<ActiveDatabase>> {
        self.active.subscribe()
    }

    /// Closes the open database, if any.
    pub async fn close(&self) -> Result<()> {
        let previous = self.active.update(|current| (None, current.clone()));
        if let Some(conn) = previous {
            debug!("Closing database {}", conn.path.display());
            conn.db.close().await?;
        }
        Ok(())
    }
}
