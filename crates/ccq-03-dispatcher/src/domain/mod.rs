//! Domain layer for the query dispatcher.

pub mod config;
pub mod entities;
pub mod errors;
pub mod per_chain;

pub use config::*;
pub use entities::*;
pub use errors::*;
pub use per_chain::*;
