//! # Error Types
//!
//! Errors raised while parsing shared primitives.

use thiserror::Error;

/// Errors raised when resolving a chain identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainIdError {
    /// The numeric value is not a registered chain.
    #[error("unknown chain ID: {0}")]
    UnknownChainId(u16),

    /// The name does not match any registered chain.
    #[error("unknown chain name: {0}")]
    UnknownChainName(String),
}

/// Errors raised when parsing environment-level values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    /// Environment name not recognised.
    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    /// Address string is not 20 bytes of hex.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
