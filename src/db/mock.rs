//! Mock database clients for testing.
//!
//! Provides scriptable in-memory backends for headless and unit tests.

use super::{DatabaseClient, QueryResult, TableInfo, TableSchema, Value};
use crate::error::{BoardError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Something the mock observed, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    /// A query call was issued.
    Started(String),
    /// A query call resolved (successfully or not).
    Finished(String),
}

/// A mock database client that returns predefined results.
///
/// Unscripted `SELECT` statements return a single-row placeholder result;
/// any other unscripted statement returns an empty result.
#[derive(Default)]
pub struct MockDatabaseClient {
    responses: HashMap<String, Result<QueryResult>>,
    delays: HashMap<String, Duration>,
    tables: Vec<(TableInfo, TableSchema)>,
    events: Mutex<Vec<MockEvent>>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful result for the exact SQL text.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.responses.insert(sql.into(), Ok(result));
        self
    }

    /// Scripts a backend failure for the exact SQL text.
    pub fn with_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .insert(sql.into(), Err(BoardError::query(message)));
        self
    }

    /// Makes the given SQL take `delay` before resolving.
    pub fn with_delay(mut self, sql: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(sql.into(), delay);
        self
    }

    /// Registers a table for `list_tables` / `table_schema`.
    pub fn with_table(mut self, info: TableInfo, schema: TableSchema) -> Self {
        self.tables.push((info, schema));
        self
    }

    /// Returns everything the mock observed so far.
    pub fn events(&self) -> Vec<MockEvent> {
        self.lock_events().clone()
    }

    /// Returns the SQL of every issued call, in issue order.
    pub fn executed(&self) -> Vec<String> {
        self.lock_events()
            .iter()
            .filter_map(|e| match e {
                MockEvent::Started(sql) => Some(sql.clone()),
                MockEvent::Finished(_) => None,
            })
            .collect()
    }

    fn lock_events(&self) -> std::sync::MutexGuard<'_, Vec<MockEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, event: MockEvent) {
        self.lock_events().push(event);
    }

    fn default_result(sql: &str) -> QueryResult {
        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            QueryResult::with_data(
                vec!["result".to_string()],
                vec![vec![Value::String(format!("Mock result for: {}", sql))]],
            )
            .with_execution_time_ms(1)
        } else {
            QueryResult::new().with_execution_time_ms(1)
        }
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.record(MockEvent::Started(sql.to_string()));

        if let Some(delay) = self.delays.get(sql) {
            tokio::time::sleep(*delay).await;
        }

        let result = match self.responses.get(sql) {
            Some(scripted) => scripted.clone(),
            None => Ok(Self::default_result(sql)),
        };

        self.record(MockEvent::Finished(sql.to_string()));
        result
    }

    async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        Ok(self.tables.iter().map(|(info, _)| info.clone()).collect())
    }

    async fn table_schema(&self, table_name: &str) -> Result<TableSchema> {
        self.tables
            .iter()
            .find(|(info, _)| info.name == table_name)
            .map(|(_, schema)| schema.clone())
            .ok_or_else(|| BoardError::query(format!("Table '{table_name}' does not exist")))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_select() {
        let client = MockDatabaseClient::new();
        let result = client.execute_query("SELECT 1").await.unwrap();
        assert_eq!(result.row_count, 1);
        assert_eq!(result.columns.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_insert() {
        let client = MockDatabaseClient::new();
        let result = client
            .execute_query("INSERT INTO test VALUES (1)")
            .await
            .unwrap();
        assert_eq!(result.row_count, 0);
    }

    #[tokio::test]
    async fn test_scripted_responses() {
        let client = MockDatabaseClient::new()
            .with_result(
                "SELECT n",
                QueryResult::with_data(vec!["n".to_string()], vec![vec![Value::Int(42)]]),
            )
            .with_error("SELECT 1/0", "division by zero");

        let ok = client.execute_query("SELECT n").await.unwrap();
        assert_eq!(ok.rows[0][0], Value::Int(42));

        let err = client.execute_query("SELECT 1/0").await.unwrap_err();
        assert_eq!(err.message(), "division by zero");
    }

    #[tokio::test]
    async fn test_events_are_recorded_in_order() {
        let client = MockDatabaseClient::new();
        client.execute_query("SELECT a").await.unwrap();
        client.execute_query("SELECT b").await.unwrap();

        assert_eq!(
            client.events(),
            vec![
                MockEvent::Started("SELECT a".to_string()),
                MockEvent::Finished("SELECT a".to_string()),
                MockEvent::Started("SELECT b".to_string()),
                MockEvent::Finished("SELECT b".to_string()),
            ]
        );
        assert_eq!(client.executed(), vec!["SELECT a", "SELECT b"]);
    }

    #[tokio::test]
    async fn test_table_data_goes_through_execute() {
        let client = MockDatabaseClient::new();
        client.get_table_data("users", 10, 0).await.unwrap();
        assert_eq!(
            client.executed(),
            vec!["SELECT * FROM \"users\" LIMIT 10 OFFSET 0"]
        );
    }
}
