//! Per-widget refresh and the projection cache.
//!
//! Each widget's query runs through the shared query executor; the result
//! is shaped for the widget and cached by widget id. The cache is derived
//! state: it is never persisted and can always be rebuilt by refreshing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dashboard::{Dashboard, DashboardWidget};
use crate::db::Row;
use crate::error::{BoardError, Result};
use crate::query::QueryExecutor;
use crate::state::Slot;
use crate::transform::{self, ProjectionShape, TableProjection};

/// A widget's view of its last successful query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetProjection {
    pub widget_id: String,
    pub data: TableProjection,
    pub shape: ProjectionShape,
    pub refreshed_at: DateTime<Utc>,
}

impl WidgetProjection {
    pub fn columns(&self) -> &[String] {
        &self.data.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.data.rows
    }

    pub fn preview_rows(&self, n: usize) -> &[Row] {
        self.data.preview_rows(n)
    }
}

/// Where a widget is in its refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum WidgetState {
    #[default]
    Idle,
    Refreshing,
    Projected,
    Failed(String),
}

/// What a `refresh_all` pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshSummary {
    /// Widgets whose projection was replaced, in refresh order.
    pub refreshed: Vec<String>,
    /// One `Refresh` error per widget that failed, in refresh order.
    pub failed: Vec<BoardError>,
}

impl RefreshSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

type ProjectionMap = HashMap<String, Arc<WidgetProjection>>;
type StateMap = HashMap<String, WidgetState>;

/// Refreshes widgets and keeps their projections.
pub struct RefreshCoordinator {
    executor: Arc<QueryExecutor>,
    projections: Slot<Arc<ProjectionMap>>,
    states: Slot<Arc<StateMap>>,
}

impl RefreshCoordinator {
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        Self {
            executor,
            projections: Slot::default(),
            states: Slot::default(),
        }
    }

    /// Runs the widget's query and replaces its projection.
    ///
    /// On failure the previous projection stays in place and the widget is
    /// marked failed; the returned error carries the widget id.
    pub async fn refresh_one(&self, widget: &DashboardWidget) -> Result<Arc<WidgetProjection>> {
        self.set_state(&widget.id, WidgetState::Refreshing);
        debug!("Refreshing widget {} ({})", widget.id, widget.widget_type);

        match self.executor.execute(&widget.query).await {
            Ok(result) => {
                let projection = Arc::new(WidgetProjection {
                    widget_id: widget.id.clone(),
                    data: TableProjection::from_result(&result),
                    shape: transform::shape(widget.widget_type, &widget.config, &result),
                    refreshed_at: Utc::now(),
                });
                self.projections.update(|current| {
                    let mut next = current.as_ref().clone();
                    next.insert(widget.id.clone(), projection.clone());
                    (Arc::new(next), ())
                });
                self.set_state(&widget.id, WidgetState::Projected);
                Ok(projection)
            }
            Err(e) => {
                let err = BoardError::refresh(&widget.id, e.message());
                warn!("{}", err);
                self.set_state(&widget.id, WidgetState::Failed(e.message().to_string()));
                Err(err)
            }
        }
    }

    /// Refreshes every widget of the dashboard, one after another in widget
    /// order. A failing widget does not stop the others.
    pub async fn refresh_all(&self, dashboard: &Dashboard) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        for widget in &dashboard.widgets {
            match self.refresh_one(widget).await {
                Ok(_) => summary.refreshed.push(widget.id.clone()),
                Err(e) => summary.failed.push(e),
            }
        }
        info!(
            "Refreshed dashboard '{}': {} ok, {} failed",
            dashboard.name,
            summary.refreshed.len(),
            summary.failed.len()
        );
        summary
    }

    /// Drops the projection and state of a widget that no longer exists.
    pub fn forget(&self, widget_id: &str) {
        self.forget_all(std::iter::once(widget_id));
    }

    pub fn forget_all<'a>(&self, widget_ids: impl IntoIterator<Item = &'a str>) {
        let ids: Vec<&str> = widget_ids.into_iter().collect();
        self.projections.update(|current| {
            let mut next = current.as_ref().clone();
            for id in &ids {
                next.remove(*id);
            }
            (Arc::new(next), ())
        });
        self.states.update(|current| {
            let mut next = current.as_ref().clone();
            for id in &ids {
                next.remove(*id);
            }
            (Arc::new(next), ())
        });
    }

    pub fn projection(&self, widget_id: &str) -> Option<Arc<WidgetProjection>> {
        self.projections.get().get(widget_id).cloned()
    }

    /// Snapshot of every cached projection, keyed by widget id.
    pub fn projections(&self) -> Arc<ProjectionMap> {
        self.projections.get()
    }

    /// Refresh state of a widget. Widgets never refreshed are idle.
    pub fn state(&self, widget_id: &str) -> WidgetState {
        self.states.get().get(widget_id).cloned().unwrap_or_default()
    }

    pub fn subscribe_projections(&self) -> watch::Receiver<Arc<ProjectionMap>> {
        self.projections.subscribe()
    }

    pub fn subscribe_states(&self) -> watch::Receiver<Arc<StateMap>> {
        self.states.subscribe()
    }

    fn set_state(&self, widget_id: &str, state: WidgetState) {
        self.states.update(|current| {
            let mut next = current.as_ref().clone();
            next.insert(widget_id.to_string(), state);
            (Arc::new(next), ())
        });
    }
}
