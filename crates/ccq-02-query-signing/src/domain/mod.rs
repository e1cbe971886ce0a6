//! Domain layer for query digests and signatures.

pub mod digest;
pub mod errors;
pub mod recovery;
