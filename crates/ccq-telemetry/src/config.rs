//! Logging settings read from the process environment.

use shared_types::Environment;
use std::env;

/// Logging configuration for a CCQ process.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Name attached to the startup log line, e.g. `ccq-guardian-dispatcher`.
    pub service_name: String,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,

    /// JSON lines instead of human-readable output.
    pub json_logs: bool,

    /// Guardian network this process belongs to.
    pub network: Environment,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "ccq".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            network: Environment::default(),
        }
    }
}

impl TelemetryConfig {
    /// Read `CCQ_SERVICE_NAME`, `CCQ_LOG_LEVEL` (falling back to `RUST_LOG`),
    /// `CCQ_JSON_LOGS`, and `CCQ_NETWORK`.
    ///
    /// JSON output defaults to on inside Kubernetes or Docker. An unparseable
    /// `CCQ_NETWORK` keeps the default network.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let in_container = env::var_os("KUBERNETES_SERVICE_HOST").is_some()
            || env::var_os("DOCKER_CONTAINER").is_some();

        Self {
            service_name: env::var("CCQ_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: env::var("CCQ_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: env::var("CCQ_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(in_container),
            network: env::var("CCQ_NETWORK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.network),
        }
    }

    /// Configuration for one actor of a role, e.g. `("guardian", "dispatcher")`.
    pub fn for_component(role: &str, component: &str) -> Self {
        Self {
            service_name: format!("ccq-{role}-{component}"),
            ..Self::from_env()
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "ccq");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
        assert_eq!(config.network, Environment::Testnet);
    }

    #[test]
    fn test_component_service_name() {
        let config = TelemetryConfig::for_component("server", "aggregator");
        assert_eq!(config.service_name, "ccq-server-aggregator");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
    }
}
