//! # Aggregator Entities

use ccq_01_wire_format::QueryResponsePublication;

/// One guardian's signature over a response digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianSignature {
    /// Slot of the signer in the guardian set.
    pub index: usize,
    /// 65-byte signature.
    pub signature: Vec<u8>,
}

/// A publication backed by a quorum of guardian signatures over one digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedResponse {
    /// The publication the guardians agreed on.
    pub response: QueryResponsePublication,
    /// Its serialized form, exactly as the guardians signed it.
    pub response_bytes: Vec<u8>,
    /// One signature per distinct guardian.
    pub signatures: Vec<GuardianSignature>,
}

/// What the accept path receives for a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// A quorum of guardians signed the same response.
    Answered(SignedResponse),
    /// Too many guardians disagree for any digest to reach quorum.
    QuorumNotMet,
}

/// Result of feeding one gossiped response to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Not for a request pending here, or already answered.
    Ignored,
    /// This guardian already signed this digest.
    DuplicateSigner,
    /// Recorded; quorum is still possible.
    Waiting {
        /// Signers of this response's digest.
        num_signers: usize,
        /// Largest signer count of any digest.
        max_matching: usize,
        /// Guardians not yet heard from.
        outstanding: usize,
        /// Signatures required.
        quorum: usize,
    },
    /// Quorum reached; the outcome was handed to the waiter.
    QuorumReached,
    /// Quorum became unreachable; the outcome was handed to the waiter.
    QuorumNotMet,
}
