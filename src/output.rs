//! Plain-text rendering for command-line output.
//!
//! Results are drawn as box tables with auto-sized columns; dashboards as
//! one block per widget.

use crate::dashboard::Dashboard;
use crate::db::{QueryResult, Row, TableInfo, TableSchema};
use crate::query::QueryHistory;
use crate::transform::{ProjectionShape, TableView};
use crate::widgets::{WidgetProjection, WidgetState};

/// Maximum width for any column.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

/// Width of the bars in chart widgets.
const CHART_BAR_WIDTH: usize = 30;

/// Renders rows under the given headers as a box table.
pub fn render_table(columns: &[String], rows: &[&Row]) -> String {
    if columns.is_empty() {
        return "(empty result)\n".to_string();
    }

    let widths = column_widths(columns, rows);
    let mut out = String::new();

    out.push_str(&border(&widths, '┌', '┬', '┐'));
    out.push_str(&line(columns.iter().map(|c| c.as_str()), &widths));
    out.push_str(&border(&widths, '├', '┼', '┤'));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|v| v.to_display_string()).collect();
        out.push_str(&line(cells.iter().map(|c| c.as_str()), &widths));
    }
    out.push_str(&border(&widths, '└', '┴', '┘'));
    out
}

/// Renders a query result through a table view, with a footer.
pub fn render_result(result: &QueryResult, view: &TableView) -> String {
    let rows = view.apply(result);
    let mut out = render_table(&result.columns, &rows);

    out.push_str(&format!(
        "{} row{} returned ({}ms)",
        result.row_count,
        if result.row_count == 1 { "" } else { "s" },
        result.execution_time_ms
    ));
    let pages = view.page_count(result.row_count);
    if pages > 1 {
        out.push_str(&format!(", page {} of {}", view.page_index() + 1, pages));
    }
    out.push('\n');
    out
}

pub fn render_tables(tables: &[TableInfo]) -> String {
    if tables.is_empty() {
        return "No tables.\n".to_string();
    }
    let width = tables.iter().map(|t| t.name.len()).max().unwrap_or(0);
    tables
        .iter()
        .map(|t| format!("{:width$}  {} rows\n", t.name, t.row_count, width = width))
        .collect()
}

pub fn render_schema(schema: &TableSchema) -> String {
    let mut out = format!("{}\n", schema.table_name);
    for col in &schema.columns {
        let mut flags = Vec::new();
        if col.is_primary_key {
            flags.push("PRIMARY KEY".to_string());
        }
        if !col.nullable {
            flags.push("NOT NULL".to_string());
        }
        if let Some(default) = &col.default_value {
            flags.push(format!("DEFAULT {default}"));
        }
        out.push_str(&format!("  {} {}", col.name, col.data_type));
        if !flags.is_empty() {
            out.push(' ');
            out.push_str(&flags.join(" "));
        }
        out.push('\n');
    }
    out
}

pub fn render_dashboards(dashboards: &[Dashboard]) -> String {
    if dashboards.is_empty() {
        return "No dashboards.\n".to_string();
    }
    dashboards
        .iter()
        .map(|d| {
            format!(
                "{}  {}  ({} widget{}, updated {})\n",
                d.id,
                d.name,
                d.widgets.len(),
                if d.widgets.len() == 1 { "" } else { "s" },
                d.updated_at
            )
        })
        .collect()
}

/// Renders every widget of a dashboard from its cached projection.
///
/// `lookup` returns the projection and refresh state for a widget id.
pub fn render_dashboard<F>(dashboard: &Dashboard, preview_rows: usize, lookup: F) -> String
where
    F: Fn(&str) -> (Option<std::sync::Arc<WidgetProjection>>, WidgetState),
{
    let mut out = format!("{}\n", dashboard.name);
    if dashboard.widgets.is_empty() {
        out.push_str("  (no widgets)\n");
        return out;
    }

    for widget in &dashboard.widgets {
        out.push_str(&format!(
            "\n== {} [{}] {}x{} at ({}, {}) ==\n",
            widget.title,
            widget.widget_type.label(),
            widget.layout.cols,
            widget.layout.rows,
            widget.layout.x,
            widget.layout.y
        ));

        let (projection, state) = lookup(&widget.id);
        if let WidgetState::Failed(message) = &state {
            out.push_str(&format!("error: {message}\n"));
        }
        match projection {
            Some(projection) => out.push_str(&render_projection(&projection, preview_rows)),
            None if matches!(state, WidgetState::Failed(_)) => {}
            None => out.push_str("(no data)\n"),
        }
    }
    out
}

fn render_projection(projection: &WidgetProjection, preview_rows: usize) -> String {
    match &projection.shape {
        ProjectionShape::Table => {
            let rows: Vec<&Row> = projection.preview_rows(preview_rows).iter().collect();
            let mut out = render_table(projection.columns(), &rows);
            let total = projection.rows().len();
            if total > rows.len() {
                out.push_str(&format!("showing {} of {} rows\n", rows.len(), total));
            }
            out
        }
        ProjectionShape::Kpi(kpi) => format!("{}: {}\n", kpi.label, kpi.value),
        ProjectionShape::Chart(chart) => {
            let max = chart
                .series
                .data
                .iter()
                .fold(0.0_f64, |acc, v| acc.max(v.abs()));
            let label_width = chart.labels.iter().map(|l| l.len()).max().unwrap_or(0);
            let mut out = format!("{} ({:?})\n", chart.series.label, chart.chart_type);
            for (label, value) in chart.labels.iter().zip(&chart.series.data) {
                let bar = if max > 0.0 {
                    ((value.abs() / max) * CHART_BAR_WIDTH as f64).round() as usize
                } else {
                    0
                };
                out.push_str(&format!(
                    "  {:label_width$}  {} {}\n",
                    label,
                    "█".repeat(bar),
                    value,
                    label_width = label_width
                ));
            }
            out
        }
    }
}

pub fn render_history(history: &QueryHistory) -> String {
    history
        .iter()
        .map(|item| match &item.error {
            None => format!(
                "{}  ok     {} rows  {}ms  {}\n",
                item.executed_at.format("%H:%M:%S"),
                item.row_count,
                item.execution_time_ms,
                item.sql
            ),
            Some(error) => format!(
                "{}  error  {}  {}\n",
                item.executed_at.format("%H:%M:%S"),
                error,
                item.sql
            ),
        })
        .collect()
}

/// Calculates the display width for each column.
fn column_widths(columns: &[String], rows: &[&Row]) -> Vec<usize> {
    let mut widths: Vec<usize> = columns
        .iter()
        .map(|c| c.chars().count().max(MIN_COLUMN_WIDTH))
        .collect();

    for row in rows {
        for (i, value) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(value.to_display_string().chars().count());
            }
        }
    }

    widths.iter().map(|&w| w.min(MAX_COLUMN_WIDTH)).collect()
}

/// Truncates to `max_width` characters, ending in an ellipsis if cut.
fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{kept}...")
    }
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}\n", segments.join(&mid.to_string()))
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut out = String::from("│");
    for (cell, &width) in cells.zip(widths) {
        let text = truncate(cell, width);
        let pad = width - text.chars().count();
        out.push_str(&format!(" {}{} │", text, " ".repeat(pad)));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{DashboardWidget, WidgetConfig, WidgetType};
    use crate::db::{ColumnInfo, Value};
    use crate::transform::{self, TableProjection};
    use chrono::Utc;
    use std::sync::Arc;

    fn sample_result() -> QueryResult {
        QueryResult::with_data(
            vec!["id".to_string(), "name".to_string(), "email".to_string()],
            vec![
                vec![Value::Int(1), Value::from("Alice"), Value::from("alice@test.com")],
                vec![Value::Int(2), Value::from("Bob"), Value::Null],
            ],
        )
        .with_execution_time_ms(23)
    }

    #[test]
    fn test_column_widths() {
        let result = sample_result();
        let rows: Vec<&Row> = result.rows.iter().collect();
        // id: MIN_COLUMN_WIDTH, name: "Alice", email: "alice@test.com"
        assert_eq!(column_widths(&result.columns, &rows), vec![4, 5, 14]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hi", 2), "hi");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_render_result() {
        let out = render_result(&sample_result(), &TableView::default());
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(
            lines[0],
            format!("┌{}┬{}┬{}┐", "─".repeat(6), "─".repeat(7), "─".repeat(16))
        );
        assert_eq!(lines[1], format!("│ id   │ name  │ email{} │", " ".repeat(9)));
        assert_eq!(lines[4], format!("│ 2    │ Bob   │ NULL{} │", " ".repeat(10)));
        assert_eq!(lines[6], "2 rows returned (23ms)");
    }

    #[test]
    fn test_render_result_pages() {
        let mut view = TableView::new(1);
        view.set_page(1);
        let out = render_result(&sample_result(), &view);
        assert!(out.contains("│ 2    │ Bob"));
        assert!(!out.contains("Alice"));
        assert!(out.ends_with("2 rows returned (23ms), page 2 of 2\n"));
    }

    #[test]
    fn test_render_empty_columns() {
        assert_eq!(render_table(&[], &[]), "(empty result)\n");
    }

    #[test]
    fn test_render_schema() {
        let schema = TableSchema {
            table_name: "users".to_string(),
            columns: vec![
                ColumnInfo {
                    name: "id".to_string(),
                    data_type: "INTEGER".to_string(),
                    nullable: false,
                    default_value: None,
                    is_primary_key: true,
                },
                ColumnInfo {
                    name: "active".to_string(),
                    data_type: "BOOLEAN".to_string(),
                    nullable: true,
                    default_value: Some("1".to_string()),
                    is_primary_key: false,
                },
            ],
        };
        assert_eq!(
            render_schema(&schema),
            "users\n  id INTEGER PRIMARY KEY NOT NULL\n  active BOOLEAN DEFAULT 1\n"
        );
    }

    #[test]
    fn test_render_dashboard_widgets() {
        let mut dashboard = Dashboard::new("Ops");
        let kpi = DashboardWidget::new(WidgetType::Kpi, "Total Users", "q", WidgetConfig::default());
        let broken = DashboardWidget::new(WidgetType::Table, "Broken", "q2", WidgetConfig::default());
        let idle = DashboardWidget::new(WidgetType::Chart, "Later", "q3", WidgetConfig::default());
        dashboard.widgets = vec![kpi.clone(), broken.clone(), idle];

        let result = QueryResult::with_data(vec!["n".to_string()], vec![vec![Value::Int(42)]]);
        let projection = Arc::new(WidgetProjection {
            widget_id: kpi.id.clone(),
            data: TableProjection::from_result(&result),
            shape: transform::shape(WidgetType::Kpi, &kpi.config, &result),
            refreshed_at: Utc::now(),
        });

        let out = render_dashboard(&dashboard, 10, |id| {
            if id == kpi.id {
                (Some(projection.clone()), WidgetState::Projected)
            } else if id == broken.id {
                (None, WidgetState::Failed("no such table: x".to_string()))
            } else {
                (None, WidgetState::Idle)
            }
        });

        assert!(out.contains("== Total Users [KPI] 1x1 at (0, 0) ==\nValue: 42\n"));
        assert!(out.contains("== Broken [Table] 2x2 at (0, 0) ==\nerror: no such table: x\n"));
        assert!(out.contains("== Later [Chart] 2x2 at (0, 0) ==\n(no data)\n"));
    }

    #[test]
    fn test_render_chart_bars() {
        let result = QueryResult::with_data(
            vec!["k".to_string(), "v".to_string()],
            vec![vec![Value::from("a"), Value::Int(2)], vec![Value::from("bb"), Value::Int(1)]],
        );
        let widget = DashboardWidget::new(WidgetType::Chart, "c", "q", WidgetConfig::default());
        let projection = WidgetProjection {
            widget_id: widget.id.clone(),
            data: TableProjection::from_result(&result),
            shape: transform::shape(WidgetType::Chart, &widget.config, &result),
            refreshed_at: Utc::now(),
        };

        let out = render_projection(&projection, 10);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "v (Bar)");
        assert_eq!(lines[1], format!("  a   {} 2", "█".repeat(30)));
        assert_eq!(lines[2], format!("  bb  {} 1", "█".repeat(15)));
    }
}
