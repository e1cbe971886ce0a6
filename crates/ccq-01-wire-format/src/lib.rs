//! # CCQ-01 Wire Format
//!
//! Binary encoding, decoding, and structural validation for cross-chain query
//! requests and response publications.
//!
//! **Architecture:** Pure domain crate (no I/O, no async)
//!
//! ## Encoding Rules
//!
//! | Rule | Detail |
//! |------|--------|
//! | Byte order | Big-endian for every integer |
//! | Repeated elements | One-byte count (1..=255) |
//! | Variable blobs | Four-byte length prefix |
//! | Strictness | Trailing bytes after a complete structure are rejected |
//! | Marshal | Validates first; an invalid value never produces bytes |
//!
//! ## Module Structure
//!
//! ```text
//! ccq-01-wire-format/
//! ├── domain/
//! │   ├── codec.rs      # Bounded big-endian reader, length-prefixed writers
//! │   ├── request.rs    # QueryRequest + five chain-specific query variants
//! │   ├── response.rs   # QueryResponsePublication + five response variants
//! │   ├── envelope.rs   # Gossip envelopes (signed request / signed response)
//! │   └── errors.rs     # WireError, ValidationError
//! └── test_helpers.rs   # Canned values for tests (feature `test-helpers`)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use domain::{
    CallData, ChainSpecificQuery, ChainSpecificResponse, EthCallByTimestampQueryRequest,
    EthCallByTimestampQueryResponse, EthCallQueryRequest, EthCallQueryResponse,
    EthCallWithFinalityQueryRequest, EthCallWithFinalityQueryResponse, EvmBlockInfo,
    PerChainQueryRequest, PerChainQueryResponse, QueryRequest, QueryResponsePublication,
    QueryType, SignedQueryRequest, SignedQueryResponse, SolanaAccountQueryRequest,
    SolanaAccountQueryResponse, SolanaAccountResult, SolanaPdaEntry, SolanaPdaQueryRequest,
    SolanaPdaQueryResponse, SolanaPdaResult, SolanaPublicKey, SolanaSlotInfo, ValidationError,
    WireError, MSG_VERSION, SOLANA_PUBLIC_KEY_LENGTH,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
