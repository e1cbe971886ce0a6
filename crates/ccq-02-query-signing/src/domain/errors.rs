//! # Signature Errors

use thiserror::Error;

/// Errors raised while recovering or producing a query signature.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Signature is not exactly 65 bytes.
    #[error("signature must be 65 bytes, got {0}")]
    InvalidLength(usize),

    /// Recovery id outside `{0, 1, 27, 28}`.
    #[error("invalid signature recovery ID: must be 0, 1, 27, or 28, got {0}")]
    InvalidRecoveryId(u8),

    /// `s` in the upper half of the curve order.
    #[error("invalid signature: s value must be in lower half of curve order")]
    MalleableSignature,

    /// `r ‖ s` is not a valid scalar pair.
    #[error("invalid signature encoding")]
    InvalidFormat,

    /// No public key recovers from this signature and digest.
    #[error("failed to recover public key from signature")]
    RecoveryFailed,

    /// Signing with the supplied key failed.
    #[error("signing failed: {0}")]
    SigningFailed(String),
}
