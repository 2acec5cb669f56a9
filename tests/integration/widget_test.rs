//! Integration tests for widget refresh against a real database.

use super::seeded_context;
use glance_board::dashboard::{ChartType, WidgetConfig, WidgetType};
use glance_board::db::Value;
use glance_board::error::BoardError;
use glance_board::transform::{KpiValue, ProjectionShape};
use glance_board::widgets::WidgetState;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[tokio::test]
async fn test_total_users_kpi() {
    let dir = tempdir().unwrap();
    let ctx = seeded_context(&dir).await;
    let dashboard = ctx.dashboards().create("Ops").await.into_value();

    let widget = ctx
        .add_widget(
            &dashboard.id,
            WidgetType::Kpi,
            "Total Users",
            "SELECT COUNT(*) AS total FROM users",
            WidgetConfig::default(),
        )
        .await
        .unwrap()
        .into_result()
        .unwrap();

    let projection = ctx.coordinator().projection(&widget.id).unwrap();
    match &projection.shape {
        ProjectionShape::Kpi(kpi) => {
            assert_eq!(kpi.value, KpiValue::Value(Value::Int(3)));
            assert_eq!(kpi.label, "Value");
            assert_eq!(kpi.value.to_string(), "3");
        }
        other => panic!("expected kpi, got {other:?}"),
    }
}

#[tokio::test]
async fn test_revenue_chart() {
    let dir = tempdir().unwrap();
    let ctx = seeded_context(&dir).await;
    let dashboard = ctx.dashboards().create("Finance").await.into_value();

    let widget = ctx
        .add_widget(
            &dashboard.id,
            WidgetType::Chart,
            "Revenue",
            "SELECT month, total FROM revenue ORDER BY rowid",
            WidgetConfig {
                chart_type: Some(ChartType::Bar),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_value();

    let projection = ctx.coordinator().projection(&widget.id).unwrap();
    let ProjectionShape::Chart(chart) = &projection.shape else {
        panic!("expected chart");
    };
    assert_eq!(chart.labels, vec!["Jan", "Feb", "Mar"]);
    assert_eq!(chart.series.label, "total");
    assert_eq!(chart.series.data, vec![120.5, 98.0, 143.25]);
}

#[tokio::test]
async fn test_chart_with_missing_columns_degrades() {
    let dir = tempdir().unwrap();
    let ctx = seeded_context(&dir).await;
    let dashboard = ctx.dashboards().create("Finance").await.into_value();

    let widget = ctx
        .add_widget(
            &dashboard.id,
            WidgetType::Chart,
            "Revenue",
            "SELECT month FROM revenue ORDER BY rowid",
            WidgetConfig {
                label_column: Some("nope".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_value();

    let projection = ctx.coordinator().projection(&widget.id).unwrap();
    let ProjectionShape::Chart(chart) = &projection.shape else {
        panic!("expected chart");
    };
    assert_eq!(chart.labels, vec!["", "", ""]);
    assert_eq!(chart.series.label, "month");
    assert_eq!(chart.series.data, vec![0.0, 0.0, 0.0]);
    assert_eq!(chart.chart_type, ChartType::Bar);
}

#[tokio::test]
async fn test_table_widget_keeps_result_as_is() {
    let dir = tempdir().unwrap();
    let ctx = seeded_context(&dir).await;
    let dashboard = ctx.dashboards().create("Ops").await.into_value();
    let sql = "SELECT id, name, country FROM users ORDER BY id";

    let widget = ctx
        .add_widget(&dashboard.id, WidgetType::Table, "Users", sql, WidgetConfig::default())
        .await
        .unwrap()
        .into_value();

    let direct = ctx.executor().execute(sql).await.unwrap();
    let projection = ctx.coordinator().projection(&widget.id).unwrap();

    assert_eq!(projection.shape, ProjectionShape::Table);
    assert_eq!(projection.columns(), direct.columns.as_slice());
    assert_eq!(projection.rows(), direct.rows.as_slice());
    assert_eq!(projection.preview_rows(2).len(), 2);
}

#[tokio::test]
async fn test_refresh_all_continues_after_a_failing_widget() {
    let dir = tempdir().unwrap();
    let ctx = seeded_context(&dir).await;
    let dashboard = ctx.dashboards().create("Ops").await.into_value();

    let broken = ctx
        .dashboards()
        .add_widget(&dashboard.id, WidgetType::Table, "Broken", "SELECT * FROM nowhere", WidgetConfig::default())
        .await
        .unwrap()
        .into_value();
    let users = ctx
        .dashboards()
        .add_widget(&dashboard.id, WidgetType::Kpi, "Users", "SELECT COUNT(*) FROM users", WidgetConfig::default())
        .await
        .unwrap()
        .into_value();

    let summary = ctx.select_dashboard(&dashboard.id).await.unwrap();

    assert_eq!(summary.refreshed, vec![users.id.clone()]);
    assert_eq!(summary.failed.len(), 1);
    match &summary.failed[0] {
        BoardError::Refresh { widget_id, message } => {
            assert_eq!(widget_id, &broken.id);
            assert!(message.contains("nowhere"));
        }
        other => panic!("expected refresh error, got {other:?}"),
    }

    assert!(ctx.coordinator().projection(&broken.id).is_none());
    assert!(matches!(ctx.coordinator().state(&broken.id), WidgetState::Failed(_)));
    assert_eq!(ctx.coordinator().state(&users.id), WidgetState::Projected);

    let history: Vec<String> = ctx.executor().history().iter().map(|h| h.sql.clone()).collect();
    assert_eq!(history, vec!["SELECT COUNT(*) FROM users", "SELECT * FROM nowhere"]);
}
