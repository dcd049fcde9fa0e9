//! The toolpin command-line interface.
//!
//! Parsing, tracing setup and subcommands live here so they can be tested
//! without spawning the binary; `main.rs` wires them to the renderers.

pub mod cli;
pub mod commands;
pub mod errors;
pub mod manifest;
pub mod tracing;

pub use cli::{Cli, Commands};
pub use errors::{CliError, EXIT_FAILURE, EXIT_OK, exit_code_for, render_error};
pub use manifest::Manifest;
