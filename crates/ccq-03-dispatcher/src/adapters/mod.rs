//! Adapters implementing the dispatcher's outbound ports.

pub mod channels;

pub use channels::{ChannelPublishSink, ChannelRouter, ChannelRouterBuilder};
