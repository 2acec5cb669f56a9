//! End-to-end scenarios against a scripted backend.

use glance_board::app::AppContext;
use glance_board::config::Config;
use glance_board::connection::ConnectionManager;
use glance_board::dashboard::{WidgetConfig, WidgetType};
use glance_board::db::{MockDatabaseClient, QueryResult, Value};
use glance_board::persistence::MemorySettingsStore;
use glance_board::transform::{KpiValue, ProjectionShape};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn context(mock: MockDatabaseClient) -> AppContext {
    let connections = Arc::new(ConnectionManager::with_client("/data/app.db", Arc::new(mock)));
    AppContext::with_connections(
        Config::default(),
        Arc::new(MemorySettingsStore::new()),
        connections,
    )
}

#[tokio::test]
async fn test_new_kpi_widget_layout_and_value() {
    let sql = "SELECT COUNT(*) AS n FROM users";
    let ctx = context(MockDatabaseClient::new().with_result(
        sql,
        QueryResult::with_data(vec!["n".to_string()], vec![vec![Value::Int(42)]]),
    ));
    let dashboard = ctx.dashboards().create("d1").await.into_value();

    let widget = ctx
        .add_widget(&dashboard.id, WidgetType::Kpi, "Total Users", sql, WidgetConfig::default())
        .await
        .unwrap()
        .into_value();

    assert_eq!(
        (widget.layout.x, widget.layout.y, widget.layout.cols, widget.layout.rows),
        (0, 0, 1, 1)
    );
    let projection = ctx.coordinator().projection(&widget.id).unwrap();
    let ProjectionShape::Kpi(kpi) = &projection.shape else {
        panic!("expected kpi");
    };
    assert_eq!(kpi.value, KpiValue::Value(Value::Int(42)));
}

#[tokio::test]
async fn test_division_by_zero_failure() {
    let ctx = context(MockDatabaseClient::new().with_error("SELECT 1/0", "division by zero"));
    let executor = ctx.executor();

    let before = executor.execute("SELECT 1").await.unwrap();
    let entries_before = executor.history().len();

    let err = executor.execute("SELECT 1/0").await.unwrap_err();
    assert_eq!(err.message(), "division by zero");

    assert_eq!(executor.current_error().as_deref(), Some("division by zero"));
    assert_eq!(executor.current_result(), Some(before));

    let history = executor.history();
    assert_eq!(history.len(), entries_before + 1);
    let latest = history.latest().unwrap();
    assert!(!latest.success);
    assert_eq!(latest.error.as_deref(), Some("division by zero"));
}
