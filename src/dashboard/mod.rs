//! Dashboards and their widgets.
//!
//! The types here are the persisted shape: field names and enum spellings
//! match the stored JSON documents (camelCase keys, lowercase enum values).

mod store;

pub use store::{DashboardStore, WriteOutcome};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Returns the current time as an ISO-8601 UTC timestamp with milliseconds.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generates a fresh unique id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// What a widget renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Chart,
    Table,
    Kpi,
}

impl WidgetType {
    /// Returns the type as its persisted string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Table => "table",
            Self::Kpi => "kpi",
        }
    }

    /// Parses a widget type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "chart" => Some(Self::Chart),
            "table" => Some(Self::Table),
            "kpi" => Some(Self::Kpi),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Chart => "Chart",
            Self::Table => "Table",
            Self::Kpi => "KPI",
        }
    }

    /// Grid span given to a new widget of this type: KPIs take one cell,
    /// everything else a 2x2 block.
    pub fn default_span(&self) -> u32 {
        match self {
            Self::Kpi => 1,
            Self::Chart | Self::Table => 2,
        }
    }
}

impl std::fmt::Display for WidgetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chart flavours a chart widget can be drawn as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
    Doughnut,
}

impl ChartType {
    /// Parses a chart type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bar" => Some(Self::Bar),
            "line" => Some(Self::Line),
            "pie" => Some(Self::Pie),
            "doughnut" => Some(Self::Doughnut),
            _ => None,
        }
    }
}

/// Aggregation a widget may declare.
///
/// Stored and round-tripped, but projections do not apply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Count,
    Avg,
    Min,
    Max,
}

/// Rendering configuration for a widget.
///
/// Column names are not checked against anything at rest; they only take
/// effect if the widget's query result happens to contain them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
}

/// Grid position and span of a widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetLayout {
    pub x: u32,
    pub y: u32,
    pub cols: u32,
    pub rows: u32,
}

impl WidgetLayout {
    /// Layout for a freshly added widget: top-left corner, type-sized.
    ///
    /// No packing happens here; placing widgets is up to the grid.
    pub fn for_type(widget_type: WidgetType) -> Self {
        let span = widget_type.default_span();
        Self {
            x: 0,
            y: 0,
            cols: span,
            rows: span,
        }
    }
}

/// One typed unit of a dashboard, driven by a single SQL query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardWidget {
    pub id: String,

    #[serde(rename = "type")]
    pub widget_type: WidgetType,

    pub title: String,

    /// SQL text, passed to the backend verbatim.
    pub query: String,

    #[serde(flatten)]
    pub layout: WidgetLayout,

    #[serde(default)]
    pub config: WidgetConfig,
}

impl DashboardWidget {
    /// Builds a widget with a fresh id and the default layout for its type.
    pub fn new(
        widget_type: WidgetType,
        title: impl Into<String>,
        query: impl Into<String>,
        config: WidgetConfig,
    ) -> Self {
        Self {
            id: new_id(),
            widget_type,
            title: title.into(),
            query: query.into(),
            layout: WidgetLayout::for_type(widget_type),
            config,
        }
    }
}

/// A named collection of widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub widgets: Vec<DashboardWidget>,
    pub created_at: String,
    pub updated_at: String,
}

impl Dashboard {
    /// Creates an empty dashboard with a fresh id, stamped now.
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_iso();
        Self {
            id: new_id(),
            name: name.into(),
            widgets: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Refreshes `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = now_iso();
    }

    /// Finds a widget by id.
    pub fn widget(&self, widget_id: &str) -> Option<&DashboardWidget> {
        self.widgets.iter().find(|w| w.id == widget_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_widget_type_parse() {
        assert_eq!(WidgetType::parse("KPI"), Some(WidgetType::Kpi));
        assert_eq!(WidgetType::parse("chart"), Some(WidgetType::Chart));
        assert_eq!(WidgetType::parse("gauge"), None);
    }

    #[test]
    fn test_default_layout_by_type() {
        assert_eq!(
            WidgetLayout::for_type(WidgetType::Kpi),
            WidgetLayout { x: 0, y: 0, cols: 1, rows: 1 }
        );
        assert_eq!(
            WidgetLayout::for_type(WidgetType::Table),
            WidgetLayout { x: 0, y: 0, cols: 2, rows: 2 }
        );
        assert_eq!(WidgetLayout::for_type(WidgetType::Chart).cols, 2);
    }

    #[test]
    fn test_new_dashboard() {
        let dashboard = Dashboard::new("Sales");
        assert_eq!(dashboard.name, "Sales");
        assert!(dashboard.widgets.is_empty());
        assert_eq!(dashboard.created_at, dashboard.updated_at);
        assert!(dashboard.created_at.ends_with('Z'));
        assert_ne!(Dashboard::new("Sales").id, dashboard.id);
    }

    #[test]
    fn test_widget_serialized_shape() {
        let widget = DashboardWidget {
            id: "w1".to_string(),
            widget_type: WidgetType::Chart,
            title: "Revenue".to_string(),
            query: "SELECT month, total FROM revenue".to_string(),
            layout: WidgetLayout { x: 2, y: 0, cols: 2, rows: 2 },
            config: WidgetConfig {
                chart_type: Some(ChartType::Line),
                label_column: Some("month".to_string()),
                ..Default::default()
            },
        };

        assert_eq!(
            serde_json::to_value(&widget).unwrap(),
            json!({
                "id": "w1",
                "type": "chart",
                "title": "Revenue",
                "query": "SELECT month, total FROM revenue",
                "x": 2,
                "y": 0,
                "cols": 2,
                "rows": 2,
                "config": { "chartType": "line", "labelColumn": "month" }
            })
        );
    }

    #[test]
    fn test_dashboard_deserializes_stored_document() {
        let stored = json!({
            "id": "d1",
            "name": "Ops",
            "widgets": [{
                "id": "w1",
                "type": "kpi",
                "title": "Total Users",
                "query": "SELECT COUNT(*) AS n FROM users",
                "x": 0, "y": 0, "cols": 1, "rows": 1,
                "config": { "aggregation": "sum" }
            }],
            "createdAt": "2024-05-01T10:00:00.000Z",
            "updatedAt": "2024-05-02T10:00:00.000Z"
        });

        let dashboard: Dashboard = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(dashboard.widgets[0].widget_type, WidgetType::Kpi);
        assert_eq!(dashboard.widgets[0].config.aggregation, Some(Aggregation::Sum));
        assert_eq!(dashboard.widget("w1").map(|w| w.layout.cols), Some(1));

        // Re-encoding reproduces the stored document.
        assert_eq!(serde_json::to_value(&dashboard).unwrap(), stored);
    }

    #[test]
    fn test_missing_config_defaults() {
        let widget: DashboardWidget = serde_json::from_value(json!({
            "id": "w", "type": "table", "title": "t", "query": "q",
            "x": 0, "y": 0, "cols": 2, "rows": 2
        }))
        .unwrap();
        assert_eq!(widget.config, WidgetConfig::default());
    }
}
