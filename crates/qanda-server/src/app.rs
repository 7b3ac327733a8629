//! Server lifecycle: serve until a shutdown signal, then stop workers.

use crate::{di::AppModule, startup};
use anyhow::Context;
use qanda_config::AppConfig;
use qanda_rest::create_router;
use tokio::signal;
use tracing::{error, info};

/// Builds the application and serves it until Ctrl-C or SIGTERM.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let module = AppModule::build(config).await?;
    let config = module.config();

    let router = create_router(module.app_state(), module.verifier(), config);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    startup::print_startup_info(config);
    info!("Listening on http://{}", addr);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error");

    module.shutdown().await;
    info!("Server shutdown complete");
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
