//! Library exports for carebook-cli.
//!
//! The CLI structure is exported so documentation tooling can walk the
//! command tree.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

pub use cli::Cli;
