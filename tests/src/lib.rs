//! # Cross-Chain Query Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── network.rs        # In-process guardian network + client
//! └── integration/      # Multi-guardian scenarios
//!     └── end_to_end.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ccq-tests
//! cargo bench -p ccq-tests
//! ```

pub mod integration;
pub mod network;
