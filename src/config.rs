//! Configuration management for glance-board.
//!
//! Handles loading configuration from a TOML file. Every section is optional
//! and falls back to the defaults the application was designed around.

use crate::error::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for glance-board.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// State database settings.
    #[serde(default)]
    pub state: StateConfig,

    /// Size limits for history, paging and previews.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Where dashboards and recent databases are stored.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StateConfig {
    /// Path to the state database. Defaults to the platform config directory.
    pub path: Option<PathBuf>,
}

/// Size limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitsConfig {
    /// Number of query history entries kept in memory.
    #[serde(default = "default_history")]
    pub history: usize,

    /// Number of recently opened databases remembered.
    #[serde(default = "default_recent_databases")]
    pub recent_databases: usize,

    /// Rows fetched per table preview page.
    #[serde(default = "default_table_page_size")]
    pub table_page_size: usize,

    /// Rows shown in a table widget.
    #[serde(default = "default_widget_preview_rows")]
    pub widget_preview_rows: usize,
}

fn default_history() -> usize {
    100
}

fn default_recent_databases() -> usize {
    10
}

fn default_table_page_size() -> usize {
    100
}

fn default_widget_preview_rows() -> usize {
    10
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            history: default_history(),
            recent_databases: default_recent_databases(),
            table_page_size: default_table_page_size(),
            widget_preview_rows: default_widget_preview_rows(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("glance-board")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| BoardError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            BoardError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects limits that would make the application unusable.
    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        for (name, value) in [
            ("limits.history", limits.history),
            ("limits.table_page_size", limits.table_page_size),
        ] {
            if value == 0 {
                return Err(BoardError::config(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }

    /// Returns the state database path, falling back to the platform default.
    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state.path {
            Some(path) => Ok(path.clone()),
            None => crate::persistence::StateDb::default_path(),
        }
    }
}
