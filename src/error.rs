//! Error types for glance-board.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for glance-board operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Database connection errors (file missing, no database open, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors reported by the backend.
    ///
    /// The message is the backend's text, passed through verbatim.
    #[error("Query error: {0}")]
    Query(String),

    /// State database read/write errors (dashboards, recent databases).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A single widget failed to refresh.
    #[error("Refresh error for widget {widget_id}: {message}")]
    Refresh { widget_id: String, message: String },

    /// A dashboard or widget named by the caller does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration errors (invalid config file, bad values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BoardError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a persistence error with the given message.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Creates a refresh error for the given widget.
    pub fn refresh(widget_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Refresh {
            widget_id: widget_id.into(),
            message: msg.into(),
        }
    }

    /// Creates a not-found error for the named kind of item.
    pub fn not_found(kind: &str, key: &str) -> Self {
        Self::NotFound(format!("{kind} not found: {key}"))
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Persistence(_) => "Persistence Error",
            Self::Refresh { .. } => "Refresh Error",
            Self::NotFound(_) => "Not Found",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the bare message without the category prefix.
    ///
    /// This is what ends up in the `current_error` slot and in history
    /// records, so backend messages reach the user unchanged.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(m)
            | Self::Query(m)
            | Self::Persistence(m)
            | Self::NotFound(m)
            | Self::Config(m)
            | Self::Internal(m) => m,
            Self::Refresh { message, .. } => message,
        }
    }
}

/// Result type alias using BoardError.
pub type Result<T> = std::result::Result<T, BoardError>;
