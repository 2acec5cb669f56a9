//! Query history for the session.
//!
//! Holds one record per executed query, newest first, bounded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Default number of records kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// One executed query. Never modified after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryHistoryItem {
    pub id: String,
    pub sql: String,
    pub executed_at: DateTime<Utc>,
    pub row_count: usize,
    pub execution_time_ms: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryHistoryItem {
    /// Record for a query that returned `row_count` rows.
    pub fn success(sql: impl Into<String>, row_count: usize, execution_time_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sql: sql.into(),
            executed_at: Utc::now(),
            row_count,
            execution_time_ms,
            success: true,
            error: None,
        }
    }

    /// Record for a query the backend rejected.
    pub fn failure(sql: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sql: sql.into(),
            executed_at: Utc::now(),
            row_count: 0,
            execution_time_ms: 0,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Stamps the record with the time the query was started.
    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.executed_at = at;
        self
    }
}

/// Bounded history, most recent first.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHistory {
    entries: VecDeque<QueryHistoryItem>,
    limit: usize,
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl QueryHistory {
    /// Creates an empty history with the default bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty history keeping at most `limit` records.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            limit,
        }
    }

    /// Returns a copy with `item` at the head, evicting the oldest record
    /// past the bound.
    pub fn with_pushed(&self, item: QueryHistoryItem) -> Self {
        let mut next = self.clone();
        next.push(item);
        next
    }

    /// Adds a record at the head.
    pub fn push(&mut self, item: QueryHistoryItem) {
        self.entries.push_front(item);
        self.entries.truncate(self.limit);
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<&QueryHistoryItem> {
        self.entries.front()
    }

    /// Records from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &QueryHistoryItem> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_history_is_empty() {
        let history = QueryHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.limit(), 100);
        assert!(history.latest().is_none());
    }

    #[test]
    fn test_newest_first() {
        let mut history = QueryHistory::new();
        history.push(QueryHistoryItem::success("SELECT 1", 1, 2));
        history.push(QueryHistoryItem::failure("SELECT nope", "no such column: nope"));

        let sql: Vec<&str> = history.iter().map(|h| h.sql.as_str()).collect();
        assert_eq!(sql, vec!["SELECT nope", "SELECT 1"]);
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        let mut history = QueryHistory::with_limit(3);
        for i in 0..5 {
            history.push(QueryHistoryItem::success(format!("SELECT {i}"), 1, 0));
        }

        let sql: Vec<&str> = history.iter().map(|h| h.sql.as_str()).collect();
        assert_eq!(sql, vec!["SELECT 4", "SELECT 3", "SELECT 2"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut history = QueryHistory::new();
        history.push(QueryHistoryItem::success("SELECT 1", 1, 0));
        history.push(QueryHistoryItem::success("SELECT 1", 1, 0));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_with_pushed_leaves_original() {
        let history = QueryHistory::new();
        let next = history.with_pushed(QueryHistoryItem::success("SELECT 1", 1, 0));
        assert!(history.is_empty());
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut history = QueryHistory::new();
        history.push(QueryHistoryItem::success("SELECT 1", 1, 0));
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_failure_record() {
        let item = QueryHistoryItem::failure("SELECT 1/0", "division by zero");
        assert!(!item.success);
        assert_eq!(item.row_count, 0);
        assert_eq!(item.error.as_deref(), Some("division by zero"));
    }

    #[test]
    fn test_serialized_keys() {
        let item = QueryHistoryItem::success("SELECT 1", 1, 5);
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("executedAt").is_some());
        assert_eq!(json["executionTimeMs"], 5);
        assert!(json.get("error").is_none());
    }
}
