//! CLI command implementations.

pub mod pull;
pub mod serve;
pub mod write;
