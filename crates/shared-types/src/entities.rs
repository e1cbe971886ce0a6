//! # Core Entities
//!
//! Fixed-width primitives and the deployment environment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::EnvironmentError;

/// A 32-byte Keccak-256 digest.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Length of a recoverable secp256k1 signature (`r ‖ s ‖ v`).
pub const SIGNATURE_LENGTH: usize = 65;

/// Format an address as `0x`-prefixed lowercase hex.
pub fn address_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Format a hash as `0x`-prefixed lowercase hex.
pub fn hash_hex(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Parse a `0x`-optional hex string into an address.
pub fn parse_address(s: &str) -> Result<Address, EnvironmentError> {
    let raw = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(raw).map_err(|_| EnvironmentError::InvalidAddress(s.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| EnvironmentError::InvalidAddress(s.to_string()))
}

/// Deployment environment. Selects the request signing prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production guardian network.
    Mainnet,
    /// Public test network.
    #[default]
    Testnet,
    /// Local development network.
    Devnet,
}

impl Environment {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Mainnet => "mainnet",
            Environment::Testnet => "testnet",
            Environment::Devnet => "devnet",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "prod" => Ok(Environment::Mainnet),
            "testnet" | "test" => Ok(Environment::Testnet),
            "devnet" | "dev" => Ok(Environment::Devnet),
            _ => Err(EnvironmentError::UnknownEnvironment(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!("mainnet".parse::<Environment>().unwrap(), Environment::Mainnet);
        assert_eq!("Dev".parse::<Environment>().unwrap(), Environment::Devnet);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_environment_serde_lowercase() {
        let json = serde_json::to_string(&Environment::Devnet).unwrap();
        assert_eq!(json, "\"devnet\"");
    }

    #[test]
    fn test_address_hex_round_trip() {
        let addr: Address = [0xab; 20];
        let s = address_hex(&addr);
        assert!(s.starts_with("0xabab"));
        assert_eq!(parse_address(&s).unwrap(), addr);
        assert!(parse_address("0x1234").is_err());
    }
}
