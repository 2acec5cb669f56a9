//! Integration tests for glance-board.

pub mod dashboard_test;
pub mod query_test;
pub mod scenario_test;
pub mod widget_test;

use glance_board::app::AppContext;
use glance_board::config::Config;
use glance_board::persistence::StateDb;
use std::sync::Arc;
use tempfile::TempDir;

/// Application context over a fresh state database and a seeded shop
/// database, both inside `dir`.
pub async fn seeded_context(dir: &TempDir) -> AppContext {
    let state = Arc::new(StateDb::open(&dir.path().join("state.db")).await.unwrap());
    let ctx = AppContext::new(Config::default(), state);
    ctx.load().await;

    ctx.session()
        .create_database(&dir.path().join("shop.db"))
        .await
        .unwrap();

    let db = ctx.connections().db().unwrap();
    for sql in [
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, country TEXT)",
        "INSERT INTO users (name, country) VALUES ('alice', 'NL'), ('bob', 'DE'), ('carol', NULL)",
        "CREATE TABLE revenue (month TEXT, total REAL)",
        "INSERT INTO revenue VALUES ('Jan', 120.5), ('Feb', 98.0), ('Mar', 143.25)",
    ] {
        db.execute_query(sql).await.unwrap();
    }
    ctx.session().refresh_tables().await.unwrap();
    ctx
}
