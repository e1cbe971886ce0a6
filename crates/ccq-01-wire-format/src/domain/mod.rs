//! Domain layer for the cross-chain query wire format.

pub mod codec;
pub mod envelope;
pub mod errors;
pub mod request;
pub mod response;

pub use envelope::{SignedQueryRequest, SignedQueryResponse};
pub use errors::{ValidationError, WireError};
pub use request::*;
pub use response::*;
