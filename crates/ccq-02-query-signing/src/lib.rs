//! # CCQ-02 Query Signing
//!
//! Digests and secp256k1 signatures for cross-chain queries.
//!
//! **Architecture:** Pure domain crate (no I/O, no async)
//!
//! ## Digests
//!
//! | Message | Digest |
//! |---------|--------|
//! | Request | `keccak256(envPrefix ‖ requestBytes)` |
//! | Response | `keccak256(responsePrefix ‖ keccak256(responseBytes))` |
//! | Request ID | `hex(signature) ‖ ":" ‖ "0x" ‖ hex(requestDigest)` |
//!
//! ## Signature Hygiene
//!
//! Every recovered signature must be exactly 65 bytes (`r ‖ s ‖ v`), carry a
//! recovery id in `{0, 1, 27, 28}`, and have `s ≤ n/2`. Signatures used as
//! request identity must be canonical, so the malleable twin is rejected.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use domain::digest::{
    keccak256, query_request_digest, query_response_digest, request_id, signing_prefix,
    QUERY_RESPONSE_PREFIX,
};
pub use domain::errors::SignatureError;
pub use domain::recovery::{
    address_from_pubkey, recover_prefixed_signer, recover_query_request_signer,
    recover_response_signer, sign_query_request, sign_query_response, sign_digest,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
