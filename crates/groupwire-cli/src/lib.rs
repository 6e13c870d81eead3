//! CLI, match front end and relay wiring
//!
//! This crate provides the `groupwire` command-line interface.

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::Cli;
pub use error::{CliError, CliResult};
