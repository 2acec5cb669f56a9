//! Pure functions that shape one query result for display.
//!
//! Nothing here touches the backend or shared state. The widget's declared
//! `aggregation` is not applied: rows are shown as the query returned them.

pub mod chart;
pub mod kpi;
pub mod table;

pub use chart::{project_chart, ChartProjection, ChartSeries};
pub use kpi::{project_kpi, KpiProjection, KpiValue, KPI_PLACEHOLDER};
pub use table::{compare_cells, SortDirection, TableProjection, TableView, DEFAULT_PAGE_SIZE};

use serde::Serialize;

use crate::dashboard::{WidgetConfig, WidgetType};
use crate::db::QueryResult;

/// The type-specific part of a widget's projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProjectionShape {
    /// Rows are shown as they are.
    Table,
    Chart(ChartProjection),
    Kpi(KpiProjection),
}

/// Shapes `result` for a widget of `widget_type`.
pub fn shape(widget_type: WidgetType, config: &WidgetConfig, result: &QueryResult) -> ProjectionShape {
    match widget_type {
        WidgetType::Table => ProjectionShape::Table,
        WidgetType::Chart => ProjectionShape::Chart(project_chart(result, config)),
        WidgetType::Kpi => ProjectionShape::Kpi(project_kpi(result, config)),
    }
}
