mod cors;
mod logging;
mod rate_limit;
mod retention;
mod server;
mod url;

pub use self::cors::CorsConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::rate_limit::RateLimitConfig;
pub use self::retention::RetentionConfig;
pub use self::server::ServerConfig;
pub use self::url::{UrlConfig, DEFAULT_RESERVED_PATHS};

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub url: UrlConfig,
    pub retention: RetentionConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let server_host = lookup("SERVER_HOST").unwrap_or(defaults.server.host);
        let server_port = parse_or(&lookup, "SERVER_PORT", defaults.server.port)?;

        let base_url = lookup("BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://{}:{}", server_host, server_port));
        let default_validity_minutes = parse_or(
            &lookup,
            "DEFAULT_VALIDITY_MINUTES",
            defaults.url.default_validity_minutes,
        )?;
        let short_code_length =
            parse_or(&lookup, "SHORT_CODE_LENGTH", defaults.url.short_code_length)?;
        let short_code_max_attempts = parse_or(
            &lookup,
            "SHORT_CODE_MAX_ATTEMPTS",
            defaults.url.short_code_max_attempts,
        )?;
        let strict_url_validation = parse_or(
            &lookup,
            "STRICT_URL_VALIDATION",
            defaults.url.strict_url_validation,
        )?;
        let reserved_paths = lookup("RESERVED_PATHS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_ascii_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.url.reserved_paths);

        // Retention config
        let retention_minutes = match lookup("RETENTION_MINUTES") {
            Some(raw) if !raw.trim().is_empty() => Some(raw.trim().parse().map_err(|_| {
                AppError::Configuration("Invalid RETENTION_MINUTES".to_string())
            })?),
            _ => None,
        };
        let sweep_interval_seconds = parse_or(
            &lookup,
            "RETENTION_SWEEP_SECONDS",
            defaults.retention.sweep_interval_seconds,
        )?;

        // Rate limit config
        let rate_limit_enabled =
            parse_or(&lookup, "RATE_LIMIT_ENABLED", defaults.rate_limit.enabled)?;
        let requests_per_minute = parse_or(
            &lookup,
            "RATE_LIMIT_PER_MINUTE",
            defaults.rate_limit.requests_per_minute,
        )?;
        let burst_size = parse_or(&lookup, "RATE_LIMIT_BURST", defaults.rate_limit.burst_size)?;

        // CORS config
        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|raw| CorsConfig::parse_origins(&raw))
            .unwrap_or(defaults.cors.allowed_origins);

        let format = parse_or(&lookup, "LOG_FORMAT", defaults.logging.format)?;

        let config = Config {
            server: ServerConfig {
                host: server_host,
                port: server_port,
            },
            url: UrlConfig {
                base_url,
                default_validity_minutes,
                short_code_length,
                short_code_max_attempts,
                strict_url_validation,
                reserved_paths,
            },
            retention: RetentionConfig {
                retention_minutes,
                sweep_interval_seconds,
            },
            rate_limit: RateLimitConfig {
                enabled: rate_limit_enabled,
                requests_per_minute,
                burst_size,
            },
            cors: CorsConfig { allowed_origins },
            logging: LoggingConfig { format },
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        self.url.validate().map_err(AppError::Configuration)?;
        self.retention.validate().map_err(AppError::Configuration)?;
        self.rate_limit.validate().map_err(AppError::Configuration)?;

        if self.cors.allowed_origins.is_empty() {
            return Err(AppError::Configuration(
                "ALLOWED_ORIGINS must list at least one origin".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", key))),
        None => Ok(default),
    }
}
