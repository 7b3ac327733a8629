//! Main application router.

use crate::{
    controllers::{answer_controller, health_controller, hub_controller, metrics_controller, question_controller},
    middleware::{auth_middleware, logging_middleware, AuthMiddlewareState},
    openapi::ApiDoc,
    state::AppState,
};
use axum::{http::HeaderValue, middleware, routing::get, Router};
use qanda_config::{AppConfig, ServerConfig};
use qanda_security::IdentityVerifier;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Creates the main application router.
///
/// `verifier` validates bearer tokens for the API routes; the push hub,
/// health probes, and metrics are anonymous.
pub fn create_router(state: AppState, verifier: Arc<dyn IdentityVerifier>, config: &AppConfig) -> Router {
    let auth_state = AuthMiddlewareState::new(verifier);

    let api_router = Router::new()
        .nest("/questions", question_controller::router())
        .nest("/answers", answer_controller::router())
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let mut router = Router::new()
        .merge(health_controller::router())
        .merge(hub_controller::router(&config.realtime.path))
        .nest("/api", api_router)
        .route("/", get(root));

    if config.observability.metrics_enabled {
        router = router.merge(metrics_controller::router(&config.observability.metrics_path));
    }

    let router = router
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(create_cors_layer(&config.server))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(logging_middleware));

    info!(
        hub = %config.realtime.path,
        "Router created with REST endpoints and Swagger UI at /swagger-ui"
    );
    router
}

/// Creates a CORS layer based on server configuration.
fn create_cors_layer(server_config: &ServerConfig) -> CorsLayer {
    if server_config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server_config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Root endpoint handler.
async fn root() -> &'static str {
    "Qanda API"
}
