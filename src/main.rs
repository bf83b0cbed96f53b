//! Musicflow Catalog - ingest a music directory into a relational catalog.
//!
//! The catalog holds one record per audio file plus the entities derived
//! from it: artists, tags, lyrics, albums and album covers. Importing is
//! idempotent, so the same directory can be imported again at any time and
//! only new files are added.

pub mod batch;
pub mod cli;
pub mod config;
pub mod cover;
pub mod db;
pub mod derive;
pub mod error;
pub mod import;
pub mod metadata;
pub mod model;
pub mod relocate;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("musicflow_catalog=info".parse()?))
        .init();

    cli::run_command(&args)
}
