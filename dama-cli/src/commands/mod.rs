//! CLI command implementations.

pub mod play;
pub mod replay;
