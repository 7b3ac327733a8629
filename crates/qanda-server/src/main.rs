//! # Qanda Server
//!
//! Entry point: loads configuration, initialises logging, and serves the API
//! and push hub until Ctrl-C or SIGTERM.

use qanda_config::ConfigLoader;
use qanda_server::{app, logging, startup};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("No .env file loaded: {e}");
    }

    let config = match ConfigLoader::from_default_location() {
        Ok(loader) => loader.get().await,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability);
    startup::print_banner();
    info!("Starting Qanda Server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    if let Err(e) = app::run(config).await {
        error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}
