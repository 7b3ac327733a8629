//! Tracing subscriber setup.

use qanda_config::ObservabilityConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Builds the filter: `RUST_LOG` wins, otherwise the configured level for
/// the qanda crates with HTTP tracing at debug.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},qanda={level},tower_http=debug,http=info",
            level = config.log_level
        ))
    })
}

/// Installs the global subscriber in pretty or JSON format.
pub fn init_logging(config: &ObservabilityConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let result = if config.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialised: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_does_not_panic() {
        let config = ObservabilityConfig::default();
        init_logging(&config);
        init_logging(&config);
    }

    #[test]
    fn test_json_format_selected() {
        let config = ObservabilityConfig {
            log_format: "json".to_string(),
            ..ObservabilityConfig::default()
        };
        assert!(config.is_json());
        let _ = env_filter(&config);
    }
}
