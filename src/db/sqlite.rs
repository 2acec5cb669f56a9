//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient` trait
//! for SQLite database files using sqlx.

use crate::db::{
    quote_identifier, ColumnInfo, DatabaseClient, QueryResult, Row, TableInfo, TableSchema, Value,
};
use crate::error::{BoardError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

/// Maximum pooled connections for a database file.
const MAX_CONNECTIONS: u32 = 4;

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens an existing database file. Fails if the file does not exist.
    pub async fn open(path: &Path) -> Result<Self> {
        Self::connect(path, false).await
    }

    /// Opens a database file, creating it when missing.
    pub async fn create(path: &Path) -> Result<Self> {
        Self::connect(path, true).await
    }

    /// Opens a private in-memory database.
    ///
    /// The pool is limited to one connection so every query sees the same
    /// database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BoardError::connection(format!("Failed to open database: {e}")))?;
        Ok(Self { pool })
    }

    async fn connect(path: &Path, create: bool) -> Result<Self> {
        debug!("Opening database {} (create: {})", path.display(), create);

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| BoardError::connection(format!("Failed to open database: {e}")))?;

        Ok(Self { pool })
    }

    /// Fetches column names and declared types for a statement that
    /// returned no rows.
    async fn describe_columns(&self, sql: &str) -> (Vec<String>, Vec<String>) {
        match self.pool.describe(sql).await {
            Ok(describe) => describe
                .columns()
                .iter()
                .map(|col| (col.name().to_string(), col.type_info().name().to_string()))
                .unzip(),
            Err(_) => (Vec::new(), Vec::new()),
        }
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BoardError::query(format_query_error(e)))?;

        let execution_time_ms = start.elapsed().as_millis() as u64;

        let (columns, column_types) = match result.first() {
            Some(first_row) => column_metadata(first_row),
            None => self.describe_columns(sql).await,
        };

        // Every statement's rows come back in one list, so SQL holding
        // several queries of different shapes cannot form a single grid.
        if let Some(row) = result.iter().find(|row| !same_shape(row, &columns)) {
            return Err(BoardError::query(format!(
                "Statements return different columns ({} vs {}); run them one at a time",
                columns.join(", "),
                row.columns()
                    .iter()
                    .map(|c| c.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let rows: Vec<Row> = result.iter().map(convert_row).collect();
        let row_count = rows.len();

        Ok(QueryResult {
            columns,
            column_types,
            rows,
            row_count,
            execution_time_ms,
        })
    }

    async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BoardError::query(format!("Failed to fetch tables: {e}")))?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let count_sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(&name));
            let row_count: i64 = sqlx::query_scalar(&count_sql)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    BoardError::query(format!("Failed to count rows in {name}: {e}"))
                })?;
            tables.push(TableInfo { name, row_count });
        }

        Ok(tables)
    }

    async fn table_schema(&self, table_name: &str) -> Result<TableSchema> {
        let pragma = format!("PRAGMA table_info({})", quote_identifier(table_name));
        let rows: Vec<(i64, String, String, i64, Option<String>, i64)> = sqlx::query_as(&pragma)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                BoardError::query(format!("Failed to fetch columns for {table_name}: {e}"))
            })?;

        if rows.is_empty() {
            return Err(BoardError::query(format!(
                "Table '{table_name}' does not exist"
            )));
        }

        let columns = rows
            .into_iter()
            .map(|(_, name, data_type, not_null, default_value, pk)| ColumnInfo {
                name,
                data_type,
                nullable: not_null == 0,
                default_value,
                is_primary_key: pk > 0,
            })
            .collect();

        Ok(TableSchema {
            table_name: table_name.to_string(),
            columns,
        })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn same_shape(row: &SqliteRow, columns: &[String]) -> bool {
    row.columns().len() == columns.len()
        && row
            .columns()
            .iter()
            .zip(columns)
            .all(|(col, name)| col.name() == name)
}

/// Extracts column names and types from a result row.
///
/// SQLite reports the declared type when the column maps to a table column;
/// expression columns fall back to the storage class of the first value.
fn column_metadata(row: &SqliteRow) -> (Vec<String>, Vec<String>) {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let declared = col.type_info().name();
            let type_name = if declared.eq_ignore_ascii_case("NULL") {
                row.try_get_raw(i)
                    .map(|raw| raw.type_info().name().to_string())
                    .unwrap_or_else(|_| declared.to_string())
            } else {
                declared.to_string()
            };
            (col.name().to_string(), type_name)
        })
        .unzip()
}

/// Converts a SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts a single column value from a SqliteRow to our Value type.
///
/// Decoding follows the storage class of the value itself, since SQLite
/// columns are dynamically typed.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    match storage.as_str() {
        "BOOLEAN" => row
            .try_get::<bool, _>(index)
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INTEGER" | "INT" | "BIGINT" | "INT8" => row
            .try_get::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => row
            .try_get::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(|b| Value::String(format!("<{} bytes>", b.len())))
            .unwrap_or(Value::Null),

        _ => row
            .try_get::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Formats a sqlx error into the message shown to the user.
///
/// Engine errors keep the engine's own wording, without the sqlx wrapper.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
