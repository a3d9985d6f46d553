//! CLI command implementations.

pub mod common;
pub mod solve;
pub mod validate;
pub mod version;
