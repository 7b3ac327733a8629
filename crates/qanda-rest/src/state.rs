//! Application state for Axum handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use qanda_config::RealtimeConfig;
use qanda_repository::DatabasePool;
use qanda_service::{ConnectionHub, QuestionService};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub question_service: Arc<dyn QuestionService>,
    pub hub: Arc<ConnectionHub>,
    pub realtime: Arc<RealtimeConfig>,
    /// Database probed by `/ready`. `None` when running on the in-memory store.
    pub database: Option<Arc<DatabasePool>>,
    /// Prometheus exporter handle rendered by `/metrics`.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        question_service: Arc<dyn QuestionService>,
        hub: Arc<ConnectionHub>,
        realtime: Arc<RealtimeConfig>,
    ) -> Self {
        Self {
            question_service,
            hub,
            realtime,
            database: None,
            metrics: None,
        }
    }

    /// Sets the database checked by the readiness probe.
    #[must_use]
    pub fn with_database(mut self, database: Arc<DatabasePool>) -> Self {
        self.database = Some(database);
        self
    }

    /// Sets the Prometheus handle served on `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
