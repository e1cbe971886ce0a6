//! Adapters implementing the aggregator's outbound ports.

pub mod channels;
pub mod guardians;

pub use channels::ChannelRequestPublisher;
pub use guardians::StaticGuardianSet;
