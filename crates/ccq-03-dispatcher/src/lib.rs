//! # CCQ-03 Query Dispatcher
//!
//! Guardian-side actor that turns a signed, multi-chain query request into a
//! single ordered response publication.
//!
//! **Architecture:** Hexagonal (ports in `ports/`, tokio channels in `adapters/`)
//!
//! ## Request Lifecycle
//!
//! ```text
//! Received ──► Dispatched ──► (PartialResult)* ──► Completed
//!                   │                 │
//!                   │                 ├──► FatalAborted (any sub-query fatal)
//!                   └─────────────────┴──► TimedOut (absolute deadline)
//! ```
//!
//! ## Accept Path (in order)
//!
//! | Check | Reject reason |
//! |-------|---------------|
//! | Signer recovers | `failed_to_recover_signer` |
//! | Signer on allow-list | `unauthorized_requestor` |
//! | Request id not pending | `duplicate_request` |
//! | Payload decodes | `failed_to_unmarshal_request` |
//! | Payload validates | `invalid_request` |
//! | Every chain supported | `chain_does_not_support_ccq` |
//! | Every chain routed | `failed_to_look_up_channel` |
//!
//! ## Module Structure
//!
//! ```text
//! ccq-03-dispatcher/
//! ├── domain/
//! │   ├── config.rs     # DispatcherConfig, channel sizes
//! │   ├── per_chain.rs  # PerChainConfig table
//! │   ├── entities.rs   # PendingQuery, watcher messages
//! │   └── errors.rs     # InvalidReason, DispatchError
//! ├── ports/outbound.rs # ChainRouter, PublishSink, QueryWatcher
//! ├── adapters/         # tokio channel implementations
//! ├── service.rs        # QueryDispatcher actor
//! └── workers.rs        # per-chain watcher worker pool
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;
pub mod workers;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use adapters::{ChannelPublishSink, ChannelRouter, ChannelRouterBuilder};
pub use domain::{
    ConfigError, DispatchError, DispatcherConfig, InvalidReason, PendingQuery, PerChainConfig,
    PerChainConfigTable, PerChainQueryInternal, PerChainQueryResponseInternal, PerChainSlot,
    QueryStatus, PER_CHAIN_QUERY_CHANNEL_SIZE, QUERY_RESPONSE_CHANNEL_SIZE,
    QUERY_RESPONSE_PUBLICATION_CHANNEL_SIZE, SIGNED_QUERY_REQUEST_CHANNEL_SIZE,
};
pub use ports::{ChainRouter, PublishError, PublishSink, QueryWatcher, RouteError};
pub use service::QueryDispatcher;
pub use workers::spawn_workers;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
