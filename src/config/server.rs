//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use super::parse::{env_duration, env_opt, env_parse, parse_duration};
use super::ConfigError;

/// Request timeout configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTimeout(pub Option<Duration>);

impl RequestTimeout {
    /// Parse duration string (e.g., "30s", "2m", "off").
    pub fn parse(s: &str) -> Result<Self, String> {
        parse_duration(s).map(Self)
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }

    #[inline]
    pub fn as_duration(&self) -> Option<Duration> {
        self.0
    }
}

impl Default for RequestTimeout {
    fn default() -> Self {
        Self(Some(Duration::from_secs(30)))
    }
}

/// Server configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address (default: 0.0.0.0:8080).
    pub listen_addr: SocketAddr,
    /// Root of the file-system binding (default: working directory).
    pub base_dir: PathBuf,
    /// Time a dispatch may take before it fails with a timeout.
    pub request_timeout: RequestTimeout,
    /// How long shutdown waits for in-flight connections.
    pub drain_timeout: Duration,
    /// Time a client has to send request headers.
    pub header_timeout: Duration,
    /// Emit one access log line per request (ACCESS_LOG=1).
    pub access_log: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            request_timeout: RequestTimeout::default(),
            drain_timeout: Duration::from_secs(10),
            header_timeout: Duration::from_secs(5),
            access_log: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let listen_addr: SocketAddr = env_parse("LISTEN_ADDR", defaults.listen_addr)?;

        let base_dir = env_opt("BASE_DIR").map(PathBuf::from).unwrap_or(defaults.base_dir);
        if !base_dir.is_dir() {
            return Err(ConfigError::Invalid {
                key: "BASE_DIR".into(),
                message: format!("'{}' is not a directory", base_dir.display()),
            });
        }

        let request_timeout = RequestTimeout(env_duration("REQUEST_TIMEOUT", "30s")?);
        let drain_timeout = env_duration("DRAIN_TIMEOUT", "10s")?.unwrap_or(Duration::ZERO);
        let header_timeout = env_duration("HEADER_TIMEOUT", "5s")?.unwrap_or(defaults.header_timeout);
        let access_log = env_opt("ACCESS_LOG").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        Ok(Self {
            listen_addr,
            base_dir,
            request_timeout,
            drain_timeout,
            header_timeout,
            access_log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timeout_parse() {
        assert_eq!(
            RequestTimeout::parse("45s").unwrap().as_duration(),
            Some(Duration::from_secs(45))
        );
        assert!(!RequestTimeout::parse("off").unwrap().is_enabled());
        assert!(RequestTimeout::parse("soon").is_err());
        assert_eq!(RequestTimeout::default().as_duration(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert!(config.request_timeout.is_enabled());
        assert_eq!(config.drain_timeout, Duration::from_secs(10));
        assert_eq!(config.header_timeout, Duration::from_secs(5));
        assert!(!config.access_log);
    }
}
