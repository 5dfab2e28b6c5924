//! Policy CLI
//!
//! Library side of `policyctl`: configuration loading and the
//! implementations behind each subcommand.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod commands;
pub mod config;

// Re-exports
pub use config::CliConfig;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
