//! # Signer Recovery (secp256k1)
//!
//! Signatures are 65 bytes: `r(32) ‖ s(32) ‖ v(1)`.
//!
//! ## Security Notes
//!
//! - **Canonical recovery id**: `v` must be 0, 1, 27, or 28; 27/28 are
//!   normalized to 0/1 before recovery.
//! - **Malleability Prevention (EIP-2)**: `s` must not exceed `n/2`. The
//!   signature is part of the request identity, so its `(r, n - s)` twin
//!   would otherwise be a second, distinct request.
//! - Uses the k256 crate for recovery and signing.

use ccq_01_wire_format::{SignedQueryRequest, SignedQueryResponse};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use shared_types::{Address, Environment, Hash, SIGNATURE_LENGTH};

use super::digest::{keccak256, query_request_digest, query_response_digest};
use super::errors::SignatureError;

/// secp256k1 curve order n.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// floor(n / 2).
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Prefix browser wallets add for `personal_sign` (EIP-191).
const EIP191_PREFIX: &str = "\x19Ethereum Signed Message:\n";

// =============================================================================
// RECOVERY
// =============================================================================

/// Recover the address that produced a raw ECDSA signature over `digest`.
pub fn recover_query_request_signer(
    digest: &Hash,
    signature: &[u8],
) -> Result<Address, SignatureError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidLength(signature.len()));
    }

    let recovery_id = parse_recovery_id(signature[64])?;

    let mut s = [0u8; 32];
    s.copy_from_slice(&signature[32..64]);
    if !is_low_s(&s) {
        return Err(SignatureError::MalleableSignature);
    }

    let sig = Signature::from_slice(&signature[..64]).map_err(|_| SignatureError::InvalidFormat)?;

    let recovered_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered_key))
}

/// Recover the signer of an EIP-191 `personal_sign` signature over `digest`.
pub fn recover_prefixed_signer(digest: &Hash, signature: &[u8]) -> Result<Address, SignatureError> {
    recover_query_request_signer(&eip191_hash(digest), signature)
}

/// Recover the guardian that signed a serialized publication.
pub fn recover_response_signer(
    query_response: &[u8],
    signature: &[u8],
) -> Result<Address, SignatureError> {
    recover_query_request_signer(&query_response_digest(query_response), signature)
}

/// Derive the Ethereum-style address of a public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);
    let pubkey_slice = pubkey_bytes.as_bytes();

    // Keccak256 of the public key without the 0x04 prefix
    let hash = keccak256(&pubkey_slice[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

fn eip191_hash(digest: &Hash) -> Hash {
    let mut message = format!("{EIP191_PREFIX}{}", digest.len()).into_bytes();
    message.extend_from_slice(digest);
    keccak256(&message)
}

/// Valid v values: 0, 1, 27, 28.
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };

    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}

/// `s <= n/2`, compared as big-endian integers.
fn is_low_s(s: &[u8; 32]) -> bool {
    s.as_slice() <= SECP256K1_HALF_ORDER.as_slice()
}

/// `n - s`.
fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;

    for i in (0..32).rev() {
        let diff = (SECP256K1_ORDER[i] as i32) - (s[i] as i32) - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }

    result
}

// =============================================================================
// SIGNING
// =============================================================================

/// Sign a prehashed digest, producing a canonical `r ‖ s ‖ v` with `v ∈ {0, 1}`.
pub fn sign_digest(key: &SigningKey, digest: &Hash) -> Result<Vec<u8>, SignatureError> {
    let (sig, recid) = key
        .sign_prehash_recoverable(digest)
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;

    let sig_bytes = sig.to_bytes();
    let mut s = [0u8; 32];
    s.copy_from_slice(&sig_bytes[32..]);

    let mut out = Vec::with_capacity(SIGNATURE_LENGTH);
    out.extend_from_slice(&sig_bytes[..32]);
    if is_low_s(&s) {
        out.extend_from_slice(&s);
        out.push(recid.to_byte());
    } else {
        // Negating s flips the parity of the recovered point
        out.extend_from_slice(&invert_s(&s));
        out.push(recid.to_byte() ^ 1);
    }
    Ok(out)
}

/// Sign a serialized request for `env`, as a client does before submitting it.
pub fn sign_query_request(
    key: &SigningKey,
    env: Environment,
    query_request: Vec<u8>,
) -> Result<SignedQueryRequest, SignatureError> {
    let digest = query_request_digest(env, &query_request);
    let signature = sign_digest(key, &digest)?;
    Ok(SignedQueryRequest {
        query_request,
        signature,
    })
}

/// Sign a serialized publication, as a guardian does before gossiping it.
pub fn sign_query_response(
    key: &SigningKey,
    query_response: Vec<u8>,
) -> Result<SignedQueryResponse, SignatureError> {
    let digest = query_response_digest(&query_response);
    let signature = sign_digest(key, &digest)?;
    Ok(SignedQueryResponse {
        query_response,
        signature,
    })
}
