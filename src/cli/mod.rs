//! Command-line interface for musicflow-catalog.
//!
//! This module provides CLI commands for importing a music directory,
//! deriving albums and covers, rewriting stored paths and inspecting the
//! catalog.

mod commands;

pub use commands::{Cli, Commands, run_command};
