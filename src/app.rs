//! Application context for glance-board.
//!
//! Owns every component and wires them together: the connection manager,
//! query executor, dashboard store, refresh coordinator and database
//! session. It also implements the dashboard-screen flows that span more
//! than one component (selecting a dashboard refreshes its widgets, adding
//! or editing a widget refreshes it, removing one drops its projection).

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::dashboard::{
    Dashboard, DashboardStore, DashboardWidget, WidgetConfig, WidgetType, WriteOutcome,
};
use crate::error::{BoardError, Result};
use crate::persistence::{SettingsStore, StateDb};
use crate::query::QueryExecutor;
use crate::sample::{self, SampleDataset};
use crate::session::DatabaseSession;
use crate::widgets::{RefreshCoordinator, RefreshSummary, WidgetProjection};

/// The components of one running application.
pub struct AppContext {
    config: Config,
    connections: Arc<ConnectionManager>,
    executor: Arc<QueryExecutor>,
    dashboards: DashboardStore,
    coordinator: RefreshCoordinator,
    session: DatabaseSession,
}

impl AppContext {
    /// Builds a context on top of the given settings store.
    pub fn new(config: Config, settings: Arc<dyn SettingsStore>) -> Self {
        let connections = Arc::new(ConnectionManager::new());
        Self::with_connections(config, settings, connections)
    }

    /// Builds a context around an existing connection manager.
    pub fn with_connections(
        config: Config,
        settings: Arc<dyn SettingsStore>,
        connections: Arc<ConnectionManager>,
    ) -> Self {
        let executor = Arc::new(QueryExecutor::new(
            connections.clone(),
            config.limits.history,
        ));
        let coordinator = RefreshCoordinator::new(executor.clone());
        let dashboards = DashboardStore::new(settings.clone());
        let session = DatabaseSession::new(
            connections.clone(),
            settings,
            config.limits.recent_databases,
        );

        Self {
            config,
            connections,
            executor,
            dashboards,
            coordinator,
            session,
        }
    }

    /// Opens the state database named by the config (or the platform
    /// default) and loads the persisted documents.
    pub async fn open(config: Config) -> Result<Self> {
        let state_path = config.state_path()?;
        let state_db = Arc::new(StateDb::open(&state_path).await?);
        let ctx = Self::new(config, state_db);
        ctx.load().await;
        Ok(ctx)
    }

    /// Loads dashboards and recent databases from settings.
    ///
    /// Failures are logged and left in the components' error slots.
    pub async fn load(&self) {
        if let Err(e) = self.dashboards.load().await {
            warn!("Starting without stored dashboards: {}", e);
        }
        self.session.load_recent_databases().await;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    pub fn executor(&self) -> &Arc<QueryExecutor> {
        &self.executor
    }

    pub fn dashboards(&self) -> &DashboardStore {
        &self.dashboards
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn session(&self) -> &DatabaseSession {
        &self.session
    }

    /// Writes a demo dataset into the open database and re-reads its tables.
    pub async fn create_sample_data(&self, dataset: SampleDataset) -> Result<()> {
        let db = self.connections.db()?;
        sample::create_sample_data(db.as_ref(), dataset).await?;
        self.session.refresh_tables().await
    }

    /// Finds a dashboard by id, or by exact name when no id matches.
    pub fn resolve_dashboard(&self, key: &str) -> Result<Dashboard> {
        let dashboards = self.dashboards.dashboards();
        dashboards
            .iter()
            .find(|d| d.id == key)
            .or_else(|| dashboards.iter().find(|d| d.name == key))
            .cloned()
            .ok_or_else(|| BoardError::not_found("Dashboard", key))
    }

    /// Selects a dashboard and refreshes all of its widgets.
    ///
    /// Projections of other dashboards' widgets stay cached. Returns `None`
    /// when no dashboard has this id.
    pub async fn select_dashboard(&self, id: &str) -> Option<RefreshSummary> {
        let dashboard = self.dashboards.select(id)?;
        info!("Selected dashboard '{}'", dashboard.name);
        Some(self.coordinator.refresh_all(&dashboard).await)
    }

    /// Refreshes one widget.
    pub async fn refresh_widget(&self, widget: &DashboardWidget) -> Result<Arc<WidgetProjection>> {
        self.coordinator.refresh_one(widget).await
    }

    /// Renames a dashboard. An unchanged or unknown name is not written.
    pub async fn rename_dashboard(&self, id: &str, name: &str) -> Option<WriteOutcome<Dashboard>> {
        let mut dashboard = self.dashboards.get(id)?;
        if dashboard.name == name {
            return None;
        }
        dashboard.name = name.to_string();
        Some(self.dashboards.update(dashboard).await)
    }

    /// Deletes a dashboard and drops its widgets' projections.
    pub async fn delete_dashboard(&self, id: &str) -> WriteOutcome<()> {
        let widget_ids: Vec<String> = self
            .dashboards
            .get(id)
            .map(|d| d.widgets.into_iter().map(|w| w.id).collect())
            .unwrap_or_default();

        let outcome = self.dashboards.delete(id).await;
        self.coordinator
            .forget_all(widget_ids.iter().map(String::as_str));
        outcome
    }

    /// Adds a widget and runs its query right away.
    ///
    /// A failing first refresh is logged by the coordinator; the widget is
    /// kept either way.
    pub async fn add_widget(
        &self,
        dashboard_id: &str,
        widget_type: WidgetType,
        title: &str,
        query: &str,
        config: WidgetConfig,
    ) -> Option<WriteOutcome<DashboardWidget>> {
        let outcome = self
            .dashboards
            .add_widget(dashboard_id, widget_type, title, query, config)
            .await?;
        if self.coordinator.refresh_one(outcome.value()).await.is_err() {
            debug!("New widget {} has no data yet", outcome.value().id);
        }
        Some(outcome)
    }

    /// Saves an edited widget and refreshes it.
    pub async fn edit_widget(
        &self,
        dashboard_id: &str,
        widget: DashboardWidget,
    ) -> Option<WriteOutcome<Dashboard>> {
        let outcome = self
            .dashboards
            .update_widget(dashboard_id, widget.clone())
            .await?;
        if self.coordinator.refresh_one(&widget).await.is_err() {
            debug!("Edited widget {} kept its previous data", widget.id);
        }
        Some(outcome)
    }

    /// Removes a widget and drops its projection.
    pub async fn remove_widget(
        &self,
        dashboard_id: &str,
        widget_id: &str,
    ) -> Option<WriteOutcome<Dashboard>> {
        let outcome = self
            .dashboards
            .remove_widget(dashboard_id, widget_id)
            .await?;
        self.coordinator.forget(widget_id);
        Some(outcome)
    }

    /// Closes the open database, if any.
    pub async fn shutdown(&self) -> Result<()> {
        self.connections.close().await
    }
}
