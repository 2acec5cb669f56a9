//! The dashboard collection and its write-through persistence.
//!
//! Mutations are optimistic: the in-memory collection changes first and is
//! then saved as a whole. A failed save is recorded and logged, but the
//! in-memory change stays.

use super::{Dashboard, DashboardWidget, WidgetConfig, WidgetType};
use crate::error::{BoardError, Result};
use crate::persistence::SettingsStore;
use crate::state::Slot;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Result of a mutation that is applied in memory before it is persisted.
///
/// The value is always available; `NotPersisted` only says the store did
/// not accept the new collection.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<T> {
    Persisted(T),
    NotPersisted { value: T, error: BoardError },
}

impl<T> WriteOutcome<T> {
    fn from_save(value: T, saved: Result<()>) -> Self {
        match saved {
            Ok(()) => Self::Persisted(value),
            Err(error) => Self::NotPersisted { value, error },
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Persisted(value) | Self::NotPersisted { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Persisted(value) | Self::NotPersisted { value, .. } => value,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }

    pub fn error(&self) -> Option<&BoardError> {
        match self {
            Self::Persisted(_) => None,
            Self::NotPersisted { error, .. } => Some(error),
        }
    }

    /// Treats a failed save as an error, dropping the value.
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Persisted(value) => Ok(value),
            Self::NotPersisted { error, .. } => Err(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WriteOutcome<U> {
        match self {
            Self::Persisted(value) => WriteOutcome::Persisted(f(value)),
            Self::NotPersisted { value, error } => WriteOutcome::NotPersisted {
                value: f(value),
                error,
            },
        }
    }
}

/// Owns the dashboard collection, the current selection and the last
/// persistence error.
pub struct DashboardStore {
    settings: Arc<dyn SettingsStore>,
    dashboards: Slot<Arc<Vec<Dashboard>>>,
    current: Slot<Option<Arc<Dashboard>>>,
    is_loading: Slot<bool>,
    error: Slot<Option<String>>,
}

impl DashboardStore {
    /// Creates an empty store backed by `settings`. Call [`load`](Self::load)
    /// to populate it.
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings,
            dashboards: Slot::default(),
            current: Slot::default(),
            is_loading: Slot::new(false),
            error: Slot::default(),
        }
    }

    /// Replaces the in-memory collection with the stored one.
    ///
    /// The selection is left alone; a selected dashboard that no longer
    /// exists in the loaded collection stays selected until something else
    /// is selected.
    pub async fn load(&self) -> Result<()> {
        self.is_loading.set(true);
        let loaded = self.settings.load_dashboards().await;
        self.is_loading.set(false);

        match loaded {
            Ok(dashboards) => {
                debug!("Loaded {} dashboards", dashboards.len());
                self.dashboards.set(Arc::new(dashboards));
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load dashboards: {}", e);
                self.error.set(Some(e.message().to_string()));
                Err(e)
            }
        }
    }

    /// Creates an empty dashboard and appends it to the collection.
    pub async fn create(&self, name: impl Into<String>) -> WriteOutcome<Dashboard> {
        let dashboard = Dashboard::new(name);
        let snapshot = self.dashboards.update(|current| {
            let mut next = current.as_ref().clone();
            next.push(dashboard.clone());
            let next = Arc::new(next);
            (next.clone(), next)
        });
        info!("Created dashboard '{}' ({})", dashboard.name, dashboard.id);

        let saved = self.persist(&snapshot).await;
        WriteOutcome::from_save(dashboard, saved)
    }

    /// Replaces the dashboard with the same id, refreshing `updated_at`.
    ///
    /// An unknown id leaves the collection as it is; the collection is
    /// persisted either way. If the dashboard is selected, the selection is
    /// replaced with the new version.
    pub async fn update(&self, dashboard: Dashboard) -> WriteOutcome<Dashboard> {
        let mut dashboard = dashboard;
        dashboard.touch();

        let snapshot = self.dashboards.update(|current| {
            let next: Vec<Dashboard> = current
                .iter()
                .map(|d| {
                    if d.id == dashboard.id {
                        dashboard.clone()
                    } else {
                        d.clone()
                    }
                })
                .collect();
            let next = Arc::new(next);
            (next.clone(), next)
        });

        self.current.update(|current| match current {
            Some(selected) if selected.id == dashboard.id => {
                (Some(Arc::new(dashboard.clone())), ())
            }
            other => (other.clone(), ()),
        });

        let saved = self.persist(&snapshot).await;
        WriteOutcome::from_save(dashboard, saved)
    }

    /// Removes the dashboard with this id, clearing the selection if it
    /// pointed at it.
    pub async fn delete(&self, id: &str) -> WriteOutcome<()> {
        let snapshot = self.dashboards.update(|current| {
            let next: Vec<Dashboard> = current.iter().filter(|d| d.id != id).cloned().collect();
            let next = Arc::new(next);
            (next.clone(), next)
        });

        self.current.update(|current| match current {
            Some(selected) if selected.id == id => (None, ()),
            other => (other.clone(), ()),
        });
        info!("Deleted dashboard {}", id);

        let saved = self.persist(&snapshot).await;
        WriteOutcome::from_save((), saved)
    }

    /// Makes the dashboard with this id the current one.
    ///
    /// Selection is local state and is never persisted. An unknown id
    /// clears the selection.
    pub fn select(&self, id: &str) -> Option<Arc<Dashboard>> {
        let found = self
            .dashboards
            .get()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .map(Arc::new);
        self.current.set(found.clone());
        found
    }

    /// Adds a widget with the default layout for its type.
    ///
    /// Returns `None` when no dashboard has this id.
    pub async fn add_widget(
        &self,
        dashboard_id: &str,
        widget_type: WidgetType,
        title: impl Into<String>,
        query: impl Into<String>,
        config: WidgetConfig,
    ) -> Option<WriteOutcome<DashboardWidget>> {
        let mut dashboard = self.get(dashboard_id)?;
        let widget = DashboardWidget::new(widget_type, title, query, config);
        dashboard.widgets.push(widget.clone());
        debug!("Adding {} widget {} to {}", widget_type, widget.id, dashboard_id);

        Some(self.update(dashboard).await.map(|_| widget))
    }

    /// Replaces the widget with the same id.
    ///
    /// Returns `None` when the dashboard does not exist. An unknown widget
    /// id changes nothing but still persists the dashboard.
    pub async fn update_widget(
        &self,
        dashboard_id: &str,
        widget: DashboardWidget,
    ) -> Option<WriteOutcome<Dashboard>> {
        let mut dashboard = self.get(dashboard_id)?;
        if let Some(slot) = dashboard.widgets.iter_mut().find(|w| w.id == widget.id) {
            *slot = widget;
        }
        Some(self.update(dashboard).await)
    }

    /// Removes one widget. Returns `None` when the dashboard does not exist.
    pub async fn remove_widget(
        &self,
        dashboard_id: &str,
        widget_id: &str,
    ) -> Option<WriteOutcome<Dashboard>> {
        let mut dashboard = self.get(dashboard_id)?;
        dashboard.widgets.retain(|w| w.id != widget_id);
        Some(self.update(dashboard).await)
    }

    /// Replaces the whole widget list, as reported back by a layout grid
    /// after widgets were moved or resized.
    pub async fn update_widget_positions(
        &self,
        dashboard_id: &str,
        widgets: Vec<DashboardWidget>,
    ) -> Option<WriteOutcome<Dashboard>> {
        let mut dashboard = self.get(dashboard_id)?;
        dashboard.widgets = widgets;
        Some(self.update(dashboard).await)
    }

    /// Returns a copy of the dashboard with this id.
    pub fn get(&self, id: &str) -> Option<Dashboard> {
        self.dashboards.get().iter().find(|d| d.id == id).cloned()
    }

    /// Snapshot of the whole collection.
    pub fn dashboards(&self) -> Arc<Vec<Dashboard>> {
        self.dashboards.get()
    }

    pub fn current(&self) -> Option<Arc<Dashboard>> {
        self.current.get()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.get()
    }

    /// Message of the last failed load or save.
    pub fn error(&self) -> Option<String> {
        self.error.get()
    }

    pub fn clear_error(&self) {
        self.error.set(None);
    }

    pub fn subscribe_dashboards(&self) -> watch::Receiver<Arc<Vec<Dashboard>>> {
        self.dashboards.subscribe()
    }

    pub fn subscribe_current(&self) -> watch::Receiver<Option<Arc<Dashboard>>> {
        self.current.subscribe()
    }

    async fn persist(&self, snapshot: &[Dashboard]) -> Result<()> {
        match self.settings.save_dashboards(snapshot).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Failed to save dashboards: {}", e);
                self.error.set(Some(e.message().to_string()));
                Err(e)
            }
        }
    }
}
