//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use application::ServiceConfig;
use dispatch::DispatchConfig;
use thiserror::Error;

/// A variable was set to something that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for {name}: {value:?}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Demo configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `HANDLER_TIMEOUT_MS`: per-delivery handler timeout (default: `5000`)
/// - `HANDLER_MAX_ATTEMPTS`: deliveries per handler and event (default: `1`)
/// - `COMMAND_CONFLICT_RETRIES`: reruns after a version conflict (default: `2`)
/// - `METRICS_ENABLED`: install the Prometheus recorder (default: `true`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: String,
    pub log_format: LogFormat,
    pub handler_timeout: Duration,
    pub handler_max_attempts: u32,
    pub conflict_retries: u32,
    pub metrics_enabled: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse(&lookup, "LOG_FORMAT")?.unwrap_or(defaults.log_format),
            handler_timeout: parse(&lookup, "HANDLER_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.handler_timeout),
            handler_max_attempts: parse(&lookup, "HANDLER_MAX_ATTEMPTS")?
                .unwrap_or(defaults.handler_max_attempts),
            conflict_retries: parse(&lookup, "COMMAND_CONFLICT_RETRIES")?
                .unwrap_or(defaults.conflict_retries),
            metrics_enabled: parse(&lookup, "METRICS_ENABLED")?
                .unwrap_or(defaults.metrics_enabled),
        })
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::new(self.handler_timeout, self.handler_max_attempts)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::new(self.conflict_retries)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            handler_timeout: Duration::from_millis(5000),
            handler_max_attempts: 1,
            conflict_retries: 2,
            metrics_enabled: true,
        }
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError { name, value }),
    }
}
