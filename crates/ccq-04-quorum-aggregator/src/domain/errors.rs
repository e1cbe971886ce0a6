//! # Aggregator Errors

use ccq_01_wire_format::WireError;
use ccq_02_query_signing::SignatureError;

use super::config::ConfigError;

/// Why a gossiped response was discarded. Labels feed the inbound error counter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InboundError {
    /// The publication does not decode.
    #[error("failed to unmarshal response: {0}")]
    FailedToUnmarshalResponse(WireError),

    /// The embedded request differs from the one submitted.
    #[error("embedded request does not match the pending request")]
    RequestMismatch,

    /// No signer could be recovered from the guardian signature.
    #[error("failed to verify signature on response: {0}")]
    FailedToVerifySignature(SignatureError),

    /// The signer is not in the current guardian set.
    #[error("response signed by unknown guardian {0}")]
    UnknownGuardian(String),
}

impl InboundError {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            InboundError::FailedToUnmarshalResponse(_) => "failed_to_unmarshal_response",
            InboundError::RequestMismatch => "request_mismatch",
            InboundError::FailedToVerifySignature(_) => "failed_to_verify_signature",
            InboundError::UnknownGuardian(_) => "unknown_guardian",
        }
    }
}

/// Errors surfaced to the accept path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregatorError {
    /// A field is not valid hex.
    #[error("failed to decode {field}: {reason}")]
    InvalidHex {
        /// Field name.
        field: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// The request signature is malformed or unrecoverable.
    #[error("invalid request signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    /// The request bytes do not decode or validate.
    #[error("invalid query request: {0}")]
    InvalidRequest(#[from] WireError),

    /// A request with the same signature is already waiting.
    #[error("request {0} is already pending")]
    AlreadyPending(String),

    /// No quorum answer arrived in time.
    #[error("timed out waiting for response")]
    Timeout,

    /// Guardians disagree too much for quorum.
    #[error("quorum not met")]
    QuorumNotMet,

    /// The outgoing request queue is full.
    #[error("request queue is full")]
    Busy,

    /// The aggregator is not running.
    #[error("aggregator has shut down")]
    Closed,

    /// The aggregator could not be constructed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AggregatorError {
    /// True for errors caused by the client's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AggregatorError::InvalidHex { .. }
                | AggregatorError::InvalidSignature(_)
                | AggregatorError::InvalidRequest(_)
                | AggregatorError::AlreadyPending(_)
                | AggregatorError::QuorumNotMet
        )
    }
}
