//! Dispatcher configuration with validation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared_types::{Address, Environment};
use std::collections::HashSet;
use std::time::Duration;

use super::per_chain::PerChainConfigTable;

/// Capacity of the inbound signed-request channel.
pub const SIGNED_QUERY_REQUEST_CHANNEL_SIZE: usize = 500;
/// Capacity of each per-chain watcher channel.
pub const PER_CHAIN_QUERY_CHANNEL_SIZE: usize = 250;
/// Capacity of the shared watcher-response channel.
pub const QUERY_RESPONSE_CHANNEL_SIZE: usize = 500;
/// Capacity of the outbound publication channel.
pub const QUERY_RESPONSE_PUBLICATION_CHANNEL_SIZE: usize = 500;

/// Query dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Network whose request signing prefix is accepted.
    pub environment: Environment,
    /// Absolute lifetime of a pending request.
    #[serde(with = "shared_types::humantime_serde")]
    pub request_timeout: Duration,
    /// Idle time before an unanswered sub-query is resent.
    #[serde(with = "shared_types::humantime_serde")]
    pub retry_interval: Duration,
    /// Period of the timeout / retry audit.
    #[serde(with = "shared_types::humantime_serde")]
    pub audit_interval: Duration,
    /// Signers allowed to submit requests. `None` accepts any valid signer.
    #[serde(with = "address_set")]
    pub allowed_requestors: Option<HashSet<Address>>,
    /// Chains this guardian serves queries for.
    pub per_chain: PerChainConfigTable,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            request_timeout: Duration::from_secs(60),
            retry_interval: Duration::from_secs(10),
            audit_interval: Duration::from_secs(1),
            allowed_requestors: None,
            per_chain: PerChainConfigTable::default(),
        }
    }
}

impl DispatcherConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout cannot be 0".into(),
            ));
        }
        if self.retry_interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "retry_interval cannot be 0".into(),
            ));
        }
        if self.audit_interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "audit_interval cannot be 0".into(),
            ));
        }
        if self.retry_interval >= self.request_timeout {
            return Err(ConfigError::InvalidTimeout(
                "retry_interval must be shorter than request_timeout".into(),
            ));
        }
        if self.audit_interval > self.retry_interval {
            return Err(ConfigError::InvalidTimeout(
                "audit_interval cannot exceed retry_interval".into(),
            ));
        }

        for chain in self.per_chain.chains() {
            if let Some(config) = self.per_chain.get(chain) {
                if !config.queries_supported() {
                    return Err(ConfigError::InvalidLimit(format!(
                        "invalid per chain config entry for \"{chain}\", no workers specified"
                    )));
                }
            }
        }

        Ok(())
    }

    /// True if `signer` may submit requests.
    pub fn is_allowed(&self, signer: &Address) -> bool {
        self.allowed_requestors
            .as_ref()
            .map_or(true, |allowed| allowed.contains(signer))
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Allow-list as an optional list of `0x` hex addresses.
mod address_set {
    use super::*;
    use shared_types::{address_hex, parse_address};

    pub fn serialize<S>(set: &Option<HashSet<Address>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let hexes: Option<Vec<String>> = set.as_ref().map(|set| {
            let mut hexes: Vec<String> = set.iter().map(address_hex).collect();
            hexes.sort();
            hexes
        });
        hexes.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<HashSet<Address>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hexes = Option::<Vec<String>>::deserialize(deserializer)?;
        hexes
            .map(|hexes| {
                hexes
                    .iter()
                    .map(|s| {
                        parse_address(s).map_err(|e| <D::Error as serde::de::Error>::custom(e))
                    })
                    .collect()
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::per_chain::PerChainConfig;
    use shared_types::ChainId;

    #[test]
    fn test_default_config() {
        let config = DispatcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.retry_interval, Duration::from_secs(10));
        assert_eq!(config.audit_interval, Duration::from_secs(1));
        assert!(config.is_allowed(&[7u8; 20]));
    }

    #[test]
    fn test_retry_must_be_shorter_than_timeout() {
        let config = DispatcherConfig {
            retry_interval: Duration::from_secs(60),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_zero_audit_interval_rejected() {
        let config = DispatcherConfig {
            audit_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_worker_entry_rejected() {
        let mut config = DispatcherConfig::default();
        config.per_chain.insert(ChainId::TERRA, PerChainConfig::new(0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLimit(_))
        ));
    }

    #[test]
    fn test_allow_list() {
        let allowed = [1u8; 20];
        let config = DispatcherConfig {
            allowed_requestors: Some(HashSet::from([allowed])),
            ..Default::default()
        };
        assert!(config.is_allowed(&allowed));
        assert!(!config.is_allowed(&[2u8; 20]));
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "environment": "mainnet",
            "request_timeout": "2m",
            "retry_interval": "250ms",
            "audit_interval": "100ms",
            "allowed_requestors": ["0x0101010101010101010101010101010101010101"]
        }"#;
        let config: DispatcherConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.environment, Environment::Mainnet);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.retry_interval, Duration::from_millis(250));
        assert!(config.is_allowed(&[1u8; 20]));
        assert!(!config.is_allowed(&[2u8; 20]));
        assert!(config.validate().is_ok());
    }
}
