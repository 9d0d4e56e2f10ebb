//! CLI command implementations.

pub mod common;
pub mod effects;
pub mod process;
pub mod response;
