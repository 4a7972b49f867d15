//! CLI command implementations.

pub mod config;
pub mod search;
pub mod usage;
