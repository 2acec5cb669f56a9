//! Database abstraction layer for glance-board.
//!
//! Provides a trait-based interface for the SQL engine, so the query and
//! dashboard layers never depend on a concrete backend.

mod mock;
mod schema;
mod sqlite;
mod types;

pub use mock::{MockDatabaseClient, MockEvent};
pub use schema::{ColumnInfo, DatabaseInfo, TableInfo, TableSchema};
pub use sqlite::SqliteClient;
pub use types::{QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Opens an existing database file.
///
/// This is the central factory function for database connections.
pub async fn open(path: &Path) -> Result<Arc<dyn DatabaseClient>> {
    let client = SqliteClient::open(path).await?;
    Ok(Arc::new(client))
}

/// Creates a database file (or opens it when it already exists).
pub async fn create(path: &Path) -> Result<Arc<dyn DatabaseClient>> {
    let client = SqliteClient::create(path).await?;
    Ok(Arc::new(client))
}

/// Quotes an identifier for interpolation into SQL text.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Builds the paging statement used for table previews.
pub fn table_data_sql(table_name: &str, limit: usize, offset: usize) -> String {
    format!(
        "SELECT * FROM {} LIMIT {} OFFSET {}",
        quote_identifier(table_name),
        limit,
        offset
    )
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with BoardError.
/// SQL text is passed through verbatim.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Fetches one page of a table's rows.
    async fn get_table_data(
        &self,
        table_name: &str,
        limit: usize,
        offset: usize,
    ) -> Result<QueryResult> {
        self.execute_query(&table_data_sql(table_name, limit, offset))
            .await
    }

    /// Lists user tables with their row counts.
    async fn list_tables(&self) -> Result<Vec<TableInfo>>;

    /// Describes the columns of one table.
    async fn table_schema(&self, table_name: &str) -> Result<TableSchema>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
