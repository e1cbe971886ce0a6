//! Aggregator configuration with validation.

use serde::{Deserialize, Serialize};
use shared_types::Environment;
use std::time::Duration;

/// Capacity of the inbound gossip response channel.
pub const SIGNED_QUERY_RESPONSE_CHANNEL_SIZE: usize = 500;

/// Quorum aggregator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Network whose request signing prefix clients use.
    pub environment: Environment,
    /// Guardian-side lifetime of a request.
    #[serde(with = "shared_types::humantime_serde")]
    pub request_timeout: Duration,
    /// Extra time a client waits beyond `request_timeout` for gossip to arrive.
    #[serde(with = "shared_types::humantime_serde")]
    pub response_grace_period: Duration,
    /// Period of the stale-entry sweep.
    #[serde(with = "shared_types::humantime_serde")]
    pub cleanup_interval: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            request_timeout: Duration::from_secs(60),
            response_grace_period: Duration::from_secs(10),
            cleanup_interval: Duration::from_secs(1),
        }
    }
}

impl AggregatorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout cannot be 0".into(),
            ));
        }
        if self.cleanup_interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "cleanup_interval cannot be 0".into(),
            ));
        }
        Ok(())
    }

    /// How long the accept path waits for a quorum answer.
    pub fn response_wait_timeout(&self) -> Duration {
        self.request_timeout + self.response_grace_period
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AggregatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.response_wait_timeout(), Duration::from_secs(70));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = AggregatorConfig {
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: AggregatorConfig =
            serde_json::from_str(r#"{"request_timeout": "30s", "environment": "devnet"}"#).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.environment, Environment::Devnet);
        assert_eq!(config.response_grace_period, Duration::from_secs(10));
    }
}
