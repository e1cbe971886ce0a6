//! Multi-guardian scenarios.

pub mod end_to_end;
