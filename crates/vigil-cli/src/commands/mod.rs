//! CLI command implementations.

pub mod export;
pub mod history;
pub mod start;
pub mod watch;
