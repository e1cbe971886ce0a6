//! Ports (hexagonal architecture boundaries) for the dispatcher.

pub mod outbound;

pub use outbound::*;
