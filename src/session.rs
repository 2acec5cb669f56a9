//! The open database as the user sees it: which file, its tables, the
//! selected table's schema, and the recently opened files.
//!
//! Failures of user-initiated operations are both recorded in the error
//! slot and returned, so callers can react and observers can display them.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::connection::ConnectionManager;
use crate::db::{DatabaseInfo, TableInfo, TableSchema};
use crate::error::Result;
use crate::persistence::SettingsStore;
use crate::state::Slot;

/// Default number of recent database paths remembered.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

pub struct DatabaseSession {
    connections: Arc<ConnectionManager>,
    settings: Arc<dyn SettingsStore>,
    recent_limit: usize,
    current_database: Slot<Option<String>>,
    tables: Slot<Arc<Vec<TableInfo>>>,
    selected_table: Slot<Option<String>>,
    selected_table_schema: Slot<Option<Arc<TableSchema>>>,
    recent_databases: Slot<Arc<Vec<String>>>,
    is_loading: Slot<bool>,
    error: Slot<Option<String>>,
}

impl DatabaseSession {
    pub fn new(
        connections: Arc<ConnectionManager>,
        settings: Arc<dyn SettingsStore>,
        recent_limit: usize,
    ) -> Self {
        Self {
            connections,
            settings,
            recent_limit,
            current_database: Slot::default(),
            tables: Slot::default(),
            selected_table: Slot::default(),
            selected_table_schema: Slot::default(),
            recent_databases: Slot::default(),
            is_loading: Slot::new(false),
            error: Slot::default(),
        }
    }

    /// Loads the remembered database paths. A failure is only logged.
    pub async fn load_recent_databases(&self) {
        match self.settings.load_recent_databases().await {
            Ok(paths) => {
                debug!("Loaded {} recent databases", paths.len());
                self.recent_databases.set(Arc::new(paths));
            }
            Err(e) => warn!("Failed to load recent databases: {}", e),
        }
    }

    /// Opens an existing database file and lists its tables.
    pub async fn open_database(&self, path: &Path) -> Result<DatabaseInfo> {
        self.begin_loading();
        let result: Result<DatabaseInfo> = async {
            let info = self.connections.open(path).await?;
            self.current_database.set(Some(info.path.clone()));
            self.add_to_recent(&info.path).await?;
            self.refresh_tables().await?;
            Ok(info)
        }
        .await;
        self.is_loading.set(false);
        self.recorded(result)
    }

    /// Creates a database file and opens it. The table list starts empty.
    pub async fn create_database(&self, path: &Path) -> Result<DatabaseInfo> {
        self.begin_loading();
        let result: Result<DatabaseInfo> = async {
            let info = self.connections.create(path).await?;
            self.current_database.set(Some(info.path.clone()));
            self.add_to_recent(&info.path).await?;
            self.tables.set(Arc::new(Vec::new()));
            Ok(info)
        }
        .await;
        self.is_loading.set(false);
        self.recorded(result)
    }

    /// Closes the open database and forgets its tables and selection.
    pub async fn close_database(&self) -> Result<()> {
        let result = self.connections.close().await;
        if result.is_ok() {
            self.current_database.set(None);
            self.tables.set(Arc::new(Vec::new()));
            self.selected_table.set(None);
            self.selected_table_schema.set(None);
            info!("Database closed");
        }
        self.recorded(result)
    }

    /// Re-reads the table list. Does nothing when no database is open.
    pub async fn refresh_tables(&self) -> Result<()> {
        if !self.connections.is_connected() {
            return Ok(());
        }

        let result: Result<Vec<TableInfo>> =
            async { self.connections.db()?.list_tables().await }.await;
        let tables = self.recorded(result)?;
        debug!("Database has {} tables", tables.len());
        self.tables.set(Arc::new(tables));
        Ok(())
    }

    /// Selects a table and fetches its schema.
    ///
    /// The selection changes even if the schema cannot be read.
    pub async fn select_table(&self, table_name: &str) -> Result<Arc<TableSchema>> {
        self.selected_table.set(Some(table_name.to_string()));

        let result: Result<TableSchema> =
            async { self.connections.db()?.table_schema(table_name).await }.await;
        let schema = Arc::new(self.recorded(result)?);
        self.selected_table_schema.set(Some(schema.clone()));
        Ok(schema)
    }

    /// File name of the open database, without its directory.
    pub fn database_name(&self) -> Option<String> {
        self.current_database
            .get()
            .and_then(|path| path.rsplit(['/', '\\']).next().map(str::to_string))
    }

    pub fn is_connected(&self) -> bool {
        self.connections.is_connected()
    }

    pub fn current_database(&self) -> Option<String> {
        self.current_database.get()
    }

    pub fn tables(&self) -> Arc<Vec<TableInfo>> {
        self.tables.get()
    }

    pub fn selected_table(&self) -> Option<String> {
        self.selected_table.get()
    }

    pub fn selected_table_schema(&self) -> Option<Arc<TableSchema>> {
        self.selected_table_schema.get()
    }

    /// Recently opened paths, most recent first.
    pub fn recent_databases(&self) -> Arc<Vec<String>> {
        self.recent_databases.get()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.get()
    }

    pub fn error(&self) -> Option<String> {
        self.error.get()
    }

    pub fn clear_error(&self) {
        self.error.set(None);
    }

    pub fn subscribe_tables(&self) -> watch::Receiver<Arc<Vec<TableInfo>>> {
        self.tables.subscribe()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<String>> {
        self.error.subscribe()
    }

    fn begin_loading(&self) {
        self.is_loading.set(true);
        self.error.set(None);
    }

    /// Moves `path` to the front of the recent list and saves the list.
    async fn add_to_recent(&self, path: &str) -> Result<()> {
        let limit = self.recent_limit;
        let updated = self.recent_databases.update(|current| {
            let mut next = Vec::with_capacity(limit);
            next.push(path.to_string());
            next.extend(current.iter().filter(|p| p.as_str() != path).cloned());
            next.truncate(limit);
            let next = Arc::new(next);
            (next.clone(), next)
        });
        self.settings.save_recent_databases(&updated).await
    }

    fn recorded<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!("{}", e);
            self.error.set(Some(e.message().to_string()));
        }
        result
    }
}
