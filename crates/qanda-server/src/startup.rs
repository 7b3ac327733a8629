//! Server startup utilities.

use qanda_config::AppConfig;
use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(r#"
   ____                  __
  / __ \____ _____  ____/ /___ _
 / / / / __ `/ __ \/ __  / __ `/
/ /_/ / /_/ / / / / /_/ / /_/ /
\___\_\__,_/_/ /_/\__,_/\__,_/
    "#);
}

/// Prints the bound address, cache settings, and push hub path.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    let addr = config.server.addr();
    let cache = if config.cache.enabled {
        format!("{} entries", config.cache.capacity)
    } else {
        "disabled".to_string()
    };
    let storage = if config.database.is_in_memory() {
        "in-memory"
    } else {
        "mysql"
    };

    info!("{}", separator);
    info!("REST API:  http://{}/api/questions", addr);
    info!("Push hub:  ws://{}{}", addr, config.realtime.path);
    info!("Health:    http://{}/health", addr);
    info!("API Docs:  http://{}/swagger-ui", addr);
    if config.observability.metrics_enabled {
        info!("Metrics:   http://{}{}", addr, config.observability.metrics_path);
    }
    info!("Cache:     {}", cache);
    info!("Storage:   {}", storage);
    info!("{}", separator);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_banner_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_banner();
    }

    #[test]
    fn test_print_startup_info_with_cache_disabled() {
        let _ = tracing_subscriber::fmt::try_init();
        let mut config = AppConfig::default();
        config.cache.enabled = false;
        config.observability.metrics_enabled = false;
        print_startup_info(&config);
    }
}
