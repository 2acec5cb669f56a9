//! Widget refresh coordination.

mod coordinator;

pub use coordinator::{RefreshCoordinator, RefreshSummary, WidgetProjection, WidgetState};
