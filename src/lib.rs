//! glance-board - query state, dashboards and widget projections for a
//! desktop database explorer.
//!
//! The library holds every component; the binary is a thin command-line
//! front end over [`app::AppContext`].

pub mod app;
pub mod cli;
pub mod config;
pub mod connection;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod persistence;
pub mod query;
pub mod sample;
pub mod session;
pub mod state;
pub mod transform;
pub mod widgets;
