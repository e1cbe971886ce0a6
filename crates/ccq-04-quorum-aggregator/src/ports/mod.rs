//! Ports (hexagonal architecture boundaries) for the aggregator.

pub mod outbound;

pub use outbound::*;
