//! Chart projection: one label axis and one numeric series.

use serde::Serialize;

use crate::dashboard::{ChartType, WidgetConfig};
use crate::db::QueryResult;

/// A labeled sequence of numbers, one per result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartProjection {
    pub chart_type: ChartType,
    pub labels: Vec<String>,
    pub series: ChartSeries,
}

/// Shapes a result into chart labels and a single series.
///
/// The label column defaults to the first column and the value column to
/// the second (or the first, for single-column results). Column names are
/// matched exactly. An axis whose column cannot be found yields `""` or
/// `0` for every row instead of failing.
pub fn project_chart(result: &QueryResult, config: &WidgetConfig) -> ChartProjection {
    let label_column = config
        .label_column
        .clone()
        .or_else(|| result.columns.first().cloned());
    let value_column = config
        .value_column
        .clone()
        .or_else(|| result.columns.get(1).cloned())
        .or_else(|| result.columns.first().cloned());

    let label_index = label_column.as_deref().and_then(|c| result.column_index(c));
    let value_index = value_column.as_deref().and_then(|c| result.column_index(c));

    let labels = result
        .rows
        .iter()
        .map(|row| {
            label_index
                .and_then(|i| row.get(i))
                .map(|v| v.to_label())
                .unwrap_or_default()
        })
        .collect();

    let data = result
        .rows
        .iter()
        .map(|row| {
            value_index
                .and_then(|i| row.get(i))
                .map(|v| v.to_number())
                .unwrap_or(0.0)
        })
        .collect();

    ChartProjection {
        chart_type: config.chart_type.unwrap_or_default(),
        labels,
        series: ChartSeries {
            label: value_column.unwrap_or_default(),
            data,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Value;
    use pretty_assertions::assert_eq;

    fn monthly() -> QueryResult {
        QueryResult::with_data(
            vec!["month".to_string(), "total".to_string(), "orders".to_string()],
            vec![
                vec![Value::from("Jan"), Value::Int(120), Value::Int(4)],
                vec![Value::from("Feb"), Value::Float(80.5), Value::Int(3)],
                vec![Value::Null, Value::from("42"), Value::Null],
            ],
        )
    }

    #[test]
    fn test_defaults_to_first_two_columns() {
        let chart = project_chart(&monthly(), &WidgetConfig::default());
        assert_eq!(chart.chart_type, ChartType::Bar);
        assert_eq!(chart.labels, vec!["Jan", "Feb", ""]);
        assert_eq!(chart.series.label, "total");
        assert_eq!(chart.series.data, vec![120.0, 80.5, 42.0]);
    }

    #[test]
    fn test_configured_columns() {
        let config = WidgetConfig {
            chart_type: Some(ChartType::Pie),
            value_column: Some("orders".to_string()),
            ..Default::default()
        };
        let chart = project_chart(&monthly(), &config);
        assert_eq!(chart.chart_type, ChartType::Pie);
        assert_eq!(chart.series.label, "orders");
        assert_eq!(chart.series.data, vec![4.0, 3.0, 0.0]);
    }

    #[test]
    fn test_unresolved_columns_degrade() {
        let config = WidgetConfig {
            label_column: Some("nope".to_string()),
            value_column: Some("missing".to_string()),
            ..Default::default()
        };
        let chart = project_chart(&monthly(), &config);
        assert_eq!(chart.labels, vec!["", "", ""]);
        assert_eq!(chart.series.data, vec![0.0, 0.0, 0.0]);
        assert_eq!(chart.series.label, "missing");
    }

    #[test]
    fn test_single_column_uses_it_for_both_axes() {
        let result = QueryResult::with_data(
            vec!["n".to_string()],
            vec![vec![Value::Int(5)], vec![Value::Int(7)]],
        );
        let chart = project_chart(&result, &WidgetConfig::default());
        assert_eq!(chart.labels, vec!["5", "7"]);
        assert_eq!(chart.series.data, vec![5.0, 7.0]);
    }

    #[test]
    fn test_empty_result() {
        let chart = project_chart(&QueryResult::new(), &WidgetConfig::default());
        assert!(chart.labels.is_empty());
        assert!(chart.series.data.is_empty());
        assert_eq!(chart.series.label, "");
    }

    #[test]
    fn test_non_numeric_values_become_zero() {
        let result = QueryResult::with_data(
            vec!["k".to_string(), "v".to_string()],
            vec![
                vec![Value::from("a"), Value::from("n/a")],
                vec![Value::from("b"), Value::Bool(true)],
            ],
        );
        let chart = project_chart(&result, &WidgetConfig::default());
        assert_eq!(chart.series.data, vec![0.0, 1.0]);
    }
}
