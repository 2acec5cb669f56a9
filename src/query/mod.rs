//! Query execution for glance-board.
//!
//! This module isolates SQL execution and the session's query history from
//! the dashboard layer.

pub mod executor;
pub mod history;

pub use executor::{QueryExecutor, DEFAULT_TABLE_LIMIT};
pub use history::{QueryHistory, QueryHistoryItem, DEFAULT_HISTORY_LIMIT};
