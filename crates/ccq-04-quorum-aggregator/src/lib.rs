//! # CCQ-04 Quorum Aggregator
//!
//! Client-side half of the cross-chain query protocol: accept a signed
//! request, publish it to the guardians, and answer once a super-majority of
//! them has signed the same response.
//!
//! **Architecture:** Hexagonal
//!
//! ## Flow
//!
//! ```text
//! client ──► QueryHandler ──► PendingResponseRegistry ──► RequestPublisher ──► gossip
//!                 ▲                      ▲
//!                 │ QueryOutcome         │ lookup by hex(signature)
//!                 └──── QuorumAggregator ◄──── SignedQueryResponse (gossip)
//! ```
//!
//! ## Inbound Discard Reasons
//!
//! | Reason | Cause |
//! |--------|-------|
//! | `failed_to_unmarshal_response` | Publication does not decode or validate |
//! | `request_mismatch` | Embedded request differs from the submitted one |
//! | `failed_to_verify_signature` | Guardian signature malformed or unrecoverable |
//! | `unknown_guardian` | Signer not in the current guardian set |
//!
//! ## Module Structure
//!
//! ```text
//! ccq-04-quorum-aggregator/
//! ├── domain/
//! │   ├── config.rs     # AggregatorConfig
//! │   ├── entities.rs   # SignedResponse, QueryOutcome, Aggregation
//! │   ├── errors.rs     # InboundError, AggregatorError
//! │   ├── http.rs       # JSON request/response bodies
//! │   └── pending.rs    # PendingResponseRegistry
//! ├── ports/outbound.rs # GuardianSetProvider, RequestPublisher
//! ├── adapters/         # in-memory guardian set, channel publisher
//! ├── handler.rs        # accept path
//! └── service.rs        # QuorumAggregator actor
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod handler;
pub mod ports;
pub mod service;

pub use adapters::{ChannelRequestPublisher, StaticGuardianSet};
pub use domain::{
    Aggregation, AggregatorConfig, AggregatorError, ConfigError, GuardianSignature, InboundError,
    PendingResponse, PendingResponseRegistry, QueryOutcome, QueryRequestBody, QueryResponseBody,
    RegistryStats, SignedResponse, SIGNED_QUERY_RESPONSE_CHANNEL_SIZE,
};
pub use handler::QueryHandler;
pub use ports::{GuardianSetProvider, RequestPublisher};
pub use service::QuorumAggregator;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
