//! Integration tests for dashboard persistence.

use glance_board::dashboard::{ChartType, DashboardStore, WidgetConfig, WidgetType};
use glance_board::persistence::{settings, SettingsStore, StateDb, DASHBOARDS_KEY};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn test_dashboards_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.db");

    let state = Arc::new(StateDb::open(&path).await.unwrap());
    let store = DashboardStore::new(state.clone());
    store.load().await.unwrap();

    let ops = store.create("Ops").await.into_result().unwrap();
    store
        .add_widget(
            &ops.id,
            WidgetType::Chart,
            "Revenue",
            "SELECT month, total FROM revenue",
            WidgetConfig {
                chart_type: Some(ChartType::Line),
                value_column: Some("total".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_result()
        .unwrap();
    store.create("Empty").await.into_result().unwrap();
    let saved = store.dashboards();
    state.close().await;

    let reopened = Arc::new(StateDb::open(&path).await.unwrap());
    let store = DashboardStore::new(reopened);
    store.load().await.unwrap();

    assert_eq!(*store.dashboards(), *saved);
    let widget = &store.dashboards()[0].widgets[0];
    assert_eq!(widget.config.chart_type, Some(ChartType::Line));
    assert_eq!(widget.layout.cols, 2);
}

#[tokio::test]
async fn test_load_then_save_is_idempotent() {
    let dir = tempdir().unwrap();
    let state = Arc::new(StateDb::open(&dir.path().join("state.db")).await.unwrap());

    let store = DashboardStore::new(state.clone());
    let ops = store.create("Ops").await.into_value();
    store
        .add_widget(
            &ops.id,
            WidgetType::Kpi,
            "Total Users",
            "SELECT COUNT(*) AS total FROM users",
            WidgetConfig::default(),
        )
        .await
        .unwrap()
        .into_result()
        .unwrap();

    let before = settings::get_setting(state.pool(), DASHBOARDS_KEY)
        .await
        .unwrap()
        .unwrap();

    let loaded = state.load_dashboards().await.unwrap();
    state.save_dashboards(&loaded).await.unwrap();

    let after = settings::get_setting(state.pool(), DASHBOARDS_KEY)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_stored_document_uses_widget_field_names() {
    let dir = tempdir().unwrap();
    let state = Arc::new(StateDb::open(&dir.path().join("state.db")).await.unwrap());
    let store = DashboardStore::new(state.clone());

    let ops = store.create("Ops").await.into_value();
    store
        .add_widget(&ops.id, WidgetType::Table, "Users", "SELECT * FROM users", WidgetConfig::default())
        .await
        .unwrap()
        .into_result()
        .unwrap();

    let raw = settings::get_setting(state.pool(), DASHBOARDS_KEY)
        .await
        .unwrap()
        .unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let widget = &doc[0]["widgets"][0];

    assert_eq!(widget["type"], "table");
    assert_eq!(widget["title"], "Users");
    assert_eq!(widget["cols"], 2);
    assert!(doc[0]["createdAt"].is_string());
    assert!(doc[0]["updatedAt"].is_string());
}

#[tokio::test]
async fn test_delete_and_missing_dashboard() {
    let dir = tempdir().unwrap();
    let state = Arc::new(StateDb::open(&dir.path().join("state.db")).await.unwrap());
    let store = DashboardStore::new(state.clone());

    let ops = store.create("Ops").await.into_value();
    store.select(&ops.id).unwrap();

    assert!(store
        .add_widget("missing", WidgetType::Kpi, "x", "SELECT 1", WidgetConfig::default())
        .await
        .is_none());

    store.delete(&ops.id).await.into_result().unwrap();
    assert!(store.current().is_none());
    assert!(state.load_dashboards().await.unwrap().is_empty());
}
