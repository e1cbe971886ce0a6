//! Domain layer for the quorum aggregator.

pub mod config;
pub mod entities;
pub mod errors;
pub mod http;
pub mod pending;

pub use config::*;
pub use entities::*;
pub use errors::*;
pub use http::*;
pub use pending::*;
