//! KPI projection: a single scalar from the first row.

use std::fmt;

use serde::Serialize;

use crate::dashboard::WidgetConfig;
use crate::db::{QueryResult, Value};

/// Shown when there is no value to display.
pub const KPI_PLACEHOLDER: &str = "-";

/// Caption used when the widget names no value column.
pub const DEFAULT_KPI_LABEL: &str = "Value";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KpiValue {
    Value(Value),
    Placeholder,
}

impl KpiValue {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    pub fn display(&self) -> String {
        match self {
            Self::Value(v) => v.to_display_string(),
            Self::Placeholder => KPI_PLACEHOLDER.to_string(),
        }
    }
}

impl fmt::Display for KpiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiProjection {
    pub label: String,
    pub value: KpiValue,
}

/// Picks the KPI scalar: the first row's cell in the value column (the
/// first column unless configured). No row, no such column or a NULL cell
/// gives the placeholder.
pub fn project_kpi(result: &QueryResult, config: &WidgetConfig) -> KpiProjection {
    let value_column = config
        .value_column
        .as_deref()
        .or_else(|| result.columns.first().map(String::as_str));

    let value = value_column
        .and_then(|c| result.column_index(c))
        .and_then(|i| result.rows.first().and_then(|row| row.get(i)))
        .filter(|v| !v.is_null())
        .cloned()
        .map(KpiValue::Value)
        .unwrap_or(KpiValue::Placeholder);

    KpiProjection {
        label: config
            .value_column
            .clone()
            .unwrap_or_else(|| DEFAULT_KPI_LABEL.to_string()),
        value,
    }
}
