//! Outbound (Driven) ports for the quorum aggregator.

use ccq_01_wire_format::SignedQueryRequest;
use shared_types::GuardianSet;

use crate::domain::AggregatorError;

/// Source of the current guardian set.
///
/// Read on every gossiped response, so a set rotation takes effect at once.
pub trait GuardianSetProvider: Send + Sync {
    /// The current guardian set.
    fn current(&self) -> GuardianSet;
}

/// Gossip transport for outgoing signed requests.
pub trait RequestPublisher: Send + Sync {
    /// Publish `request` to the guardians without waiting.
    fn publish_request(&self, request: SignedQueryRequest) -> Result<(), AggregatorError>;
}
