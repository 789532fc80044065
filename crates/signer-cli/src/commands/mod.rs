//! CLI command implementations.

pub mod manifest;
pub mod serve;
pub mod token;
