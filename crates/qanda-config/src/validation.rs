//! Configuration validation.
//!
//! Collects every problem in one pass so a misconfigured deployment fails
//! at startup with the full list rather than one error at a time.

use crate::AppConfig;
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// JWT secret is empty or left at the placeholder outside development.
    InsecureJwtSecret,
    /// Port number is invalid.
    InvalidPort { value: u16 },
    /// Pool size configuration is invalid (min must be <= max).
    InvalidPoolSize { min: u32, max: u32 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// A value that must be positive is zero.
    MustBePositive { name: String },
    /// Client timeout does not exceed the keep-alive interval.
    TimeoutNotAboveKeepAlive { timeout: u64, keep_alive: u64 },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsecureJwtSecret => {
                write!(f, "JWT secret must be set outside the development environment")
            }
            Self::InvalidPort { value } => write!(f, "Invalid server port: {value}"),
            Self::InvalidPoolSize { min, max } => {
                write!(f, "Invalid pool size: min ({min}) cannot be greater than max ({max})")
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {url_type} URL: {message}")
            }
            Self::MustBePositive { name } => write!(f, "'{name}' must be greater than zero"),
            Self::TimeoutNotAboveKeepAlive { timeout, keep_alive } => write!(
                f,
                "realtime.client_timeout_secs ({timeout}) must exceed realtime.keep_alive_interval_secs ({keep_alive})"
            ),
            Self::InvalidLogLevel { value } => write!(
                f,
                "Invalid log level: '{value}' (valid: trace, debug, info, warn, error)"
            ),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    const PLACEHOLDER_SECRET: &'static str = "change-me-in-production";
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    ///
    /// Returns every error found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_security(config, &mut errors);
        Self::validate_server(config, &mut errors);
        Self::validate_database(config, &mut errors);
        Self::validate_cache(config, &mut errors);
        Self::validate_realtime(config, &mut errors);
        Self::validate_observability(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_security(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let secret = config.security.jwt_secret.trim();
        if secret.is_empty()
            || (!config.app.is_development() && secret == Self::PLACEHOLDER_SECRET)
        {
            errors.push(ConfigValidationError::InsecureJwtSecret);
        }
    }

    fn validate_server(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let server = &config.server;
        if server.port == 0 {
            errors.push(ConfigValidationError::InvalidPort { value: server.port });
        }
        if server.request_timeout_secs == 0 {
            errors.push(ConfigValidationError::MustBePositive {
                name: "server.request_timeout_secs".to_string(),
            });
        }
        for origin in server.cors_origins.iter().filter(|o| o.as_str() != "*") {
            if let Err(e) = Url::parse(origin) {
                errors.push(ConfigValidationError::InvalidUrl {
                    url_type: "CORS origin".to_string(),
                    message: format!("{origin}: {e}"),
                });
            }
        }
    }

    fn validate_database(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let database = &config.database;
        if !database.is_in_memory() {
            match Url::parse(&database.url) {
                Ok(url) if url.scheme() == "mysql" => {}
                Ok(url) => errors.push(ConfigValidationError::InvalidUrl {
                    url_type: "database".to_string(),
                    message: format!("unsupported scheme '{}', expected mysql", url.scheme()),
                }),
                Err(e) => errors.push(ConfigValidationError::InvalidUrl {
                    url_type: "database".to_string(),
                    message: e.to_string(),
                }),
            }
        }

        if database.min_connections > database.max_connections {
            errors.push(ConfigValidationError::InvalidPoolSize {
                min: database.min_connections,
                max: database.max_connections,
            });
        }
        if database.max_connections == 0 {
            errors.push(ConfigValidationError::MustBePositive {
                name: "database.max_connections".to_string(),
            });
        }
    }

    fn validate_cache(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.cache.capacity().is_none() {
            errors.push(ConfigValidationError::MustBePositive {
                name: "cache.capacity".to_string(),
            });
        }
    }

    fn validate_realtime(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let realtime = &config.realtime;
        for (name, value) in [
            ("realtime.outbound_buffer", realtime.outbound_buffer),
            ("realtime.dispatch_shards", realtime.dispatch_shards),
            ("realtime.dispatch_queue", realtime.dispatch_queue),
        ] {
            if value == 0 {
                errors.push(ConfigValidationError::MustBePositive {
                    name: name.to_string(),
                });
            }
        }
        if realtime.keep_alive_interval_secs == 0 {
            errors.push(ConfigValidationError::MustBePositive {
                name: "realtime.keep_alive_interval_secs".to_string(),
            });
        }
        if realtime.client_timeout_secs <= realtime.keep_alive_interval_secs {
            errors.push(ConfigValidationError::TimeoutNotAboveKeepAlive {
                timeout: realtime.client_timeout_secs,
                keep_alive: realtime.keep_alive_interval_secs,
            });
        }
        if !realtime.path.starts_with('/') {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "realtime path".to_string(),
                message: format!("'{}' must start with '/'", realtime.path),
            });
        }
    }

    fn validate_observability(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let level = config.observability.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: config.observability.log_level.clone(),
            });
        }
    }
}
