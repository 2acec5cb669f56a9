//! Query execution with observable state.
//!
//! The executor runs one SQL statement at a time per call and publishes what
//! happened: whether anything is in flight, the last result, the last error,
//! and a bounded history. Calls are never rejected or queued; overlapping
//! calls each write their outcome when they finish, so the last one to
//! finish wins the current result.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::history::{QueryHistory, QueryHistoryItem};
use crate::connection::ConnectionManager;
use crate::db::QueryResult;
use crate::error::Result;
use crate::state::Slot;

/// Rows fetched per table page when the caller has no preference.
pub const DEFAULT_TABLE_LIMIT: usize = 100;

/// Executes queries against the open database and tracks their outcome.
pub struct QueryExecutor {
    connections: Arc<ConnectionManager>,
    in_flight: AtomicUsize,
    is_executing: Slot<bool>,
    current_result: Slot<Option<Arc<QueryResult>>>,
    current_error: Slot<Option<String>>,
    history: Slot<Arc<QueryHistory>>,
}

impl QueryExecutor {
    /// Creates an executor keeping at most `history_limit` history records.
    pub fn new(connections: Arc<ConnectionManager>, history_limit: usize) -> Self {
        Self {
            connections,
            in_flight: AtomicUsize::new(0),
            is_executing: Slot::new(false),
            current_result: Slot::default(),
            current_error: Slot::default(),
            history: Slot::new(Arc::new(QueryHistory::with_limit(history_limit))),
        }
    }

    /// Executes `sql` verbatim and records it in the history.
    ///
    /// On failure the current result is left as it was and the backend's
    /// message becomes the current error. The error is also returned.
    pub async fn execute(&self, sql: &str) -> Result<Arc<QueryResult>> {
        let _executing = self.begin();
        self.current_error.set(None);
        let started_at = Utc::now();
        debug!("Executing query: {}", sql);

        let outcome = match self.connections.db() {
            Ok(db) => db.execute_query(sql).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                self.current_result.set(Some(result.clone()));
                self.record(
                    QueryHistoryItem::success(sql, result.row_count, result.execution_time_ms)
                        .started_at(started_at),
                );
                debug!(
                    "Query returned {} rows in {} ms",
                    result.row_count, result.execution_time_ms
                );
                Ok(result)
            }
            Err(e) => {
                warn!("Query failed: {}", e);
                self.current_error.set(Some(e.message().to_string()));
                self.record(QueryHistoryItem::failure(sql, e.message()).started_at(started_at));
                Err(e)
            }
        }
    }

    /// Fetches one page of a table.
    ///
    /// Updates the busy flag, current result and current error exactly like
    /// [`execute`](Self::execute), but never touches the history.
    pub async fn get_table_data(
        &self,
        table_name: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Arc<QueryResult>> {
        let _executing = self.begin();
        self.current_error.set(None);
        debug!("Fetching {} rows of {} from {}", limit, table_name, offset);

        let outcome = match self.connections.db() {
            Ok(db) => db.get_table_data(table_name, limit, offset).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                self.current_result.set(Some(result.clone()));
                Ok(result)
            }
            Err(e) => {
                warn!("Failed to fetch table {}: {}", table_name, e);
                self.current_error.set(Some(e.message().to_string()));
                Err(e)
            }
        }
    }

    /// Clears the current result and error. History is kept.
    pub fn clear_result(&self) {
        self.current_result.set(None);
        self.current_error.set(None);
    }

    pub fn clear_history(&self) {
        self.history.update(|current| {
            let mut next = current.as_ref().clone();
            next.clear();
            (Arc::new(next), ())
        });
    }

    /// True while at least one call is in flight.
    pub fn is_executing(&self) -> bool {
        self.is_executing.get()
    }

    pub fn current_result(&self) -> Option<Arc<QueryResult>> {
        self.current_result.get()
    }

    pub fn current_error(&self) -> Option<String> {
        self.current_error.get()
    }

    /// Snapshot of the history, newest first.
    pub fn history(&self) -> Arc<QueryHistory> {
        self.history.get()
    }

    pub fn subscribe_executing(&self) -> watch::Receiver<bool> {
        self.is_executing.subscribe()
    }

    pub fn subscribe_result(&self) -> watch::Receiver<Option<Arc<QueryResult>>> {
        self.current_result.subscribe()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<String>> {
        self.current_error.subscribe()
    }

    pub fn subscribe_history(&self) -> watch::Receiver<Arc<QueryHistory>> {
        self.history.subscribe()
    }

    fn record(&self, item: QueryHistoryItem) {
        self.history
            .update(|current| (Arc::new(current.with_pushed(item)), ()));
    }

    fn begin(&self) -> ExecutingGuard<'_> {
        // The counter only changes while the slot is locked, so the flag and
        // the count never disagree.
        self.is_executing.update(|_| {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            (true, ())
        });
        ExecutingGuard { executor: self }
    }

    fn end(&self) {
        self.is_executing.update(|_| {
            let remaining = self.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            (remaining > 0, ())
        });
    }
}

/// Marks one call as in flight until dropped, whichever way the call ends.
struct ExecutingGuard<'a> {
    executor: &'a QueryExecutor,
}

impl Drop for ExecutingGuard<'_> {
    fn drop(&mut self) {
        self.executor.end();
    }
}
