//! Connection management for glance-board.
//!
//! Centralizes the lifecycle of the open database.

pub mod manager;

pub use manager::{ActiveDatabase, ConnectionManager};
