//! # Shared Types Crate
//!
//! Primitive aliases and registries used by every cross-chain query crate.
//!
//! ## Contents
//!
//! - **Chains**: the `ChainId` registry and its canonical names.
//! - **Environment**: the deployment network a guardian or client runs in.
//! - **Guardians**: the ordered guardian set and the quorum formula.
//! - **Config helpers**: human-readable `Duration` serde format.

pub mod chain;
pub mod entities;
pub mod errors;
pub mod guardian;
pub mod humantime_serde;

pub use chain::ChainId;
pub use entities::*;
pub use errors::*;
pub use guardian::{quorum, GuardianSet};
