//! Explicit dependency wiring.
//!
//! Every shared component is built once here and handed out as an `Arc`.

use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use qanda_config::AppConfig;
use qanda_repository::{create_pool, DatabasePool, InMemoryQuestionRepository, MySqlQuestionRepository, QuestionRepository};
use qanda_rest::AppState;
use qanda_security::{IdentityVerifier, TokenProvider};
use qanda_service::{build_cache, metrics::register_metrics, BroadcastDispatcher, ConnectionHub, QuestionCache, QuestionService, QuestionServiceImpl};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How long shutdown waits for queued pushes to go out.
const DISPATCH_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// The application's component graph.
pub struct AppModule {
    database: Option<Arc<DatabasePool>>,
    cache: Arc<dyn QuestionCache>,
    hub: Arc<ConnectionHub>,
    dispatcher: Arc<BroadcastDispatcher>,
    question_service: Arc<dyn QuestionService>,
    token_provider: Arc<TokenProvider>,
    metrics: Option<PrometheusHandle>,
    config: AppConfig,
}

impl AppModule {
    /// Builds every component. The dispatcher spawns its workers here, so
    /// this must run inside a Tokio runtime.
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        let metrics = if config.observability.metrics_enabled {
            Some(install_metrics_recorder()?)
        } else {
            None
        };

        let mut database = None;
        let repository: Arc<dyn QuestionRepository> = if config.database.is_in_memory() {
            warn!("No database URL configured; using the in-memory question store");
            Arc::new(InMemoryQuestionRepository::new())
        } else {
            let pool = create_pool(&config.database)
                .await
                .context("failed to connect to the database")?;
            if config.database.run_migrations {
                pool.run_migrations().await.context("failed to run migrations")?;
            }
            database = Some(Arc::clone(&pool));
            Arc::new(MySqlQuestionRepository::new(pool))
        };

        let cache = build_cache(&config.cache);
        let hub = Arc::new(ConnectionHub::new(config.realtime.outbound_buffer));
        let dispatcher = Arc::new(BroadcastDispatcher::start(
            &config.realtime,
            Arc::clone(&repository),
            hub.clone(),
        ));
        let question_service: Arc<dyn QuestionService> = Arc::new(QuestionServiceImpl::new(
            repository,
            Arc::clone(&cache),
            dispatcher.clone(),
        ));
        let token_provider = Arc::new(TokenProvider::new(Arc::new(config.security.clone())));

        info!(
            cache_capacity = cache.capacity(),
            dispatch_shards = config.realtime.dispatch_shards,
            "Application components ready"
        );

        Ok(Self {
            database,
            cache,
            hub,
            dispatcher,
            question_service,
            token_provider,
            metrics,
            config,
        })
    }

    /// Returns the configuration the module was built from.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the question cache.
    pub fn cache(&self) -> Arc<dyn QuestionCache> {
        Arc::clone(&self.cache)
    }

    /// Returns the token verifier used by the auth middleware.
    pub fn verifier(&self) -> Arc<dyn IdentityVerifier> {
        self.token_provider.clone()
    }

    /// Builds the state shared by the HTTP handlers.
    pub fn app_state(&self) -> AppState {
        let mut state = AppState::new(
            Arc::clone(&self.question_service),
            Arc::clone(&self.hub),
            Arc::new(self.config.realtime.clone()),
        );
        if let Some(database) = &self.database {
            state = state.with_database(Arc::clone(database));
        }
        if let Some(handle) = &self.metrics {
            state = state.with_metrics(handle.clone());
        }
        state
    }

    /// Stops the dispatcher and closes the database pool.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown(DISPATCH_DRAIN_TIMEOUT).await;
        if let Some(database) = &self.database {
            database.close().await;
        }
    }
}

fn install_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install the Prometheus recorder")?;
    register_metrics();
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = String::new();
        config.observability.metrics_enabled = false;
        config
    }

    #[tokio::test]
    async fn test_build_in_memory_module() {
        let module = AppModule::build(in_memory_config()).await.unwrap();

        let state = module.app_state();
        assert!(state.database.is_none());
        assert!(state.metrics.is_none());
        assert_eq!(module.cache().capacity(), module.config().cache.capacity);

        module.shutdown().await;
    }

    #[tokio::test]
    async fn test_disabled_cache_has_no_capacity() {
        let mut config = in_memory_config();
        config.cache.enabled = false;
        let module = AppModule::build(config).await.unwrap();

        assert_eq!(module.cache().capacity(), 0);
        module.shutdown().await;
    }
}
