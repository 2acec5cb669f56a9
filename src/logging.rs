//! Tracing setup for the `glance-board` binary.
//!
//! Every subcommand prints its result on stdout, so log lines go to stderr
//! unless `--log-file` is passed. `RUST_LOG` overrides the default `info`
//! level in both modes.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Sends log lines to [`get_log_path`] when `--log-file` is given.
///
/// The file is rewritten on every invocation. If it cannot be created the
/// command still runs, just without logging.
pub fn init_file_logging() {
    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return;
        }
    }

    // Truncate on each run to avoid unbounded growth
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Default for CLI runs. Piping `--output json` into another tool stays
/// clean because nothing but command output reaches stdout.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Where `--log-file` writes: `glance-board/glance-board.log` under the
/// state directory, then the config directory, then the temp directory.
pub fn get_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("glance-board").join("glance-board.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("glance-board").join("glance-board.log");
    }

    std::env::temp_dir().join("glance-board.log")
}
