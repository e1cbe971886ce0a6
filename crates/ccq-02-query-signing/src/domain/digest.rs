//! # Query Digests
//!
//! Domain separation keeps a request signature valid for exactly one
//! environment and keeps request and response signatures from being
//! interchangeable.

use ccq_01_wire_format::SignedQueryRequest;
use sha3::{Digest, Keccak256};
use shared_types::{Environment, Hash};

const MAINNET_QUERY_REQUEST_PREFIX: &[u8] = b"mainnet_query_request_000000000000|";
const TESTNET_QUERY_REQUEST_PREFIX: &[u8] = b"testnet_query_request_000000000000|";
const DEVNET_QUERY_REQUEST_PREFIX: &[u8] = b"devnet_query_request_0000000000000|";

/// Prefix of every response digest.
pub const QUERY_RESPONSE_PREFIX: &[u8] = b"query_response_0000000000000000000|";

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    finalize(hasher)
}

fn finalize(hasher: Keccak256) -> Hash {
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Request signing prefix for `env`.
pub fn signing_prefix(env: Environment) -> &'static [u8] {
    match env {
        Environment::Mainnet => MAINNET_QUERY_REQUEST_PREFIX,
        Environment::Testnet => TESTNET_QUERY_REQUEST_PREFIX,
        Environment::Devnet => DEVNET_QUERY_REQUEST_PREFIX,
    }
}

/// Digest a client signs for a serialized request.
pub fn query_request_digest(env: Environment, query_request: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(signing_prefix(env));
    hasher.update(query_request);
    finalize(hasher)
}

/// Digest a guardian signs for a serialized publication.
///
/// The inner hash lets on-chain verifiers check signatures without
/// re-hashing the full prefixed payload.
pub fn query_response_digest(query_response: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(QUERY_RESPONSE_PREFIX);
    hasher.update(keccak256(query_response));
    finalize(hasher)
}

/// Identity of a signed request on the dispatch path.
pub fn request_id(env: Environment, signed: &SignedQueryRequest) -> String {
    let digest = query_request_digest(env, &signed.query_request);
    format!("{}:0x{}", hex::encode(&signed.signature), hex::encode(digest))
}
