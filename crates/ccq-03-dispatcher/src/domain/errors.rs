//! # Dispatcher Errors
//!
//! Every rejection on the accept path carries an [`InvalidReason`] whose label
//! is the `reason` of the invalid-request counter.

use std::fmt;

use super::config::ConfigError;

/// Why a signed request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    /// Signature malformed, malleable, or not recoverable.
    FailedToRecoverSigner,
    /// Signer not on the allow-list.
    UnauthorizedRequestor,
    /// Same request id already pending.
    DuplicateRequest,
    /// Request bytes do not decode.
    FailedToUnmarshalRequest,
    /// Request decodes but breaks a structural rule.
    InvalidRequest,
    /// A sub-query targets a chain this guardian does not serve.
    ChainDoesNotSupportCcq,
    /// A served chain has no watcher route.
    FailedToLookUpChannel,
}

impl InvalidReason {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            InvalidReason::FailedToRecoverSigner => "failed_to_recover_signer",
            InvalidReason::UnauthorizedRequestor => "unauthorized_requestor",
            InvalidReason::DuplicateRequest => "duplicate_request",
            InvalidReason::FailedToUnmarshalRequest => "failed_to_unmarshal_request",
            InvalidReason::InvalidRequest => "invalid_request",
            InvalidReason::ChainDoesNotSupportCcq => "chain_does_not_support_ccq",
            InvalidReason::FailedToLookUpChannel => "failed_to_look_up_channel",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Dispatcher errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// A signed request was rejected on the accept path. No state was created.
    #[error("query request rejected ({reason}): {detail}")]
    Rejected {
        /// Metric reason.
        reason: InvalidReason,
        /// Human-readable cause.
        detail: String,
    },

    /// The dispatcher could not be constructed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DispatchError {
    pub(crate) fn rejected(reason: InvalidReason, detail: impl fmt::Display) -> Self {
        DispatchError::Rejected {
            reason,
            detail: detail.to_string(),
        }
    }

    /// Rejection reason, if this is an accept-path rejection.
    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            DispatchError::Rejected { reason, .. } => Some(*reason),
            DispatchError::Config(_) => None,
        }
    }
}
