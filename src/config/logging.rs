//! Logging configuration.

use super::parse::env_or;
use super::ConfigError;

const DEFAULT_FILTER: &str = "tokio_chain=info,access=info";

/// Output format of log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable lines.
    Plain,
}

impl LogFormat {
    fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "plain" | "text" | "pretty" => Ok(LogFormat::Plain),
            other => Err(ConfigError::Invalid {
                key: "LOG_FORMAT".into(),
                message: format!("expected json or plain, got '{}'", other),
            }),
        }
    }
}

/// Logging configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log level filter (from LOG_LEVEL or RUST_LOG).
    pub filter: String,
    /// Service name for structured logging.
    pub service_name: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            service_name: "tokio_chain".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl LoggingConfig {
    /// Load configuration from environment variables.
    ///
    /// Priority: LOG_LEVEL > RUST_LOG > default
    ///
    /// LOG_LEVEL accepts simple values: trace, debug, info, warn, error
    /// RUST_LOG accepts full tracing filter syntax: tokio_chain=debug,hyper=warn
    pub fn from_env() -> Result<Self, ConfigError> {
        let filter = resolve_log_filter(
            std::env::var("LOG_LEVEL").ok().as_deref(),
            std::env::var("RUST_LOG").ok().as_deref(),
        );
        Ok(Self {
            filter,
            service_name: env_or("SERVICE_NAME", "tokio_chain"),
            format: LogFormat::parse(&env_or("LOG_FORMAT", "json"))?,
        })
    }
}

/// Pick the filter directive. Priority: LOG_LEVEL > RUST_LOG > default.
fn resolve_log_filter(log_level: Option<&str>, rust_log: Option<&str>) -> String {
    if let Some(level) = log_level {
        let level = level.to_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {
                return format!("tokio_chain={},access=info", level);
            }
            _ => {
                // Invalid level, fall through to RUST_LOG
                eprintln!(
                    "Warning: Invalid LOG_LEVEL '{}', expected: trace, debug, info, warn, error",
                    level
                );
            }
        }
    }

    if let Some(filter) = rust_log.filter(|f| !f.is_empty()) {
        return filter.to_string();
    }

    DEFAULT_FILTER.to_string()
}
