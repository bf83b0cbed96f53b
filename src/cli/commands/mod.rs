//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `import`: catalog every audio file under the music root
//! - `albums`: derive albums and album covers from cataloged tracks
//! - `paths`: rewrite stored paths after the music root moved
//! - `stats`: row counts per catalog table

mod albums;
mod import;
mod paths;
mod stats;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::db;
use crate::error::Error;

pub use albums::cmd_albums;
pub use import::cmd_import;
pub use paths::cmd_rewrite_paths;
pub use stats::cmd_stats;

/// Musicflow catalog CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database file (overrides the config file)
    #[arg(long, global = true, env = "MUSICFLOW_DB")]
    pub db: Option<PathBuf>,

    /// Config file (default: the OS config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Catalog every audio file under the music root
    Import {
        /// Music root (overrides the config file)
        root: Option<PathBuf>,
        /// Files processed concurrently per chunk
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Per-file timeout in seconds (0 disables)
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Build albums and album covers from cataloged tracks
    Albums {
        /// Only build albums, skip cover extraction
        #[arg(long)]
        skip_covers: bool,
        /// Albums processed concurrently per chunk
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Rewrite stored track paths after the music root moved
    RewritePaths {
        /// Root the catalog currently points at
        #[arg(long)]
        from: String,
        /// New root
        #[arg(long)]
        to: String,
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Show row counts for every catalog table
    Stats,
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let config = load_config(cli)?;

    match &cli.command {
        Commands::Import {
            root,
            chunk_size,
            timeout,
        } => cmd_import(&rt, config, root.clone(), *chunk_size, *timeout),
        Commands::Albums {
            skip_covers,
            chunk_size,
        } => cmd_albums(&rt, config, *skip_covers, *chunk_size),
        Commands::RewritePaths { from, to, dry_run } => {
            cmd_rewrite_paths(&rt, &config, from, to, *dry_run)
        }
        Commands::Stats => cmd_stats(&rt, &config),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Load the config file and apply global flag overrides.
///
/// An explicit `--config` must exist and parse; the default location falls
/// back to built-in defaults.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => config::load_from(path).map_err(Error::from)?,
        None => config::load(),
    };
    if let Some(db) = &cli.db {
        config.database.path = Some(db.clone());
    }
    Ok(config)
}

/// Open the catalog database named by the config.
pub(crate) async fn open_pool(config: &Config) -> anyhow::Result<SqlitePool> {
    let url = db::db_url(config.database.path.as_deref());
    db::init_db(&url)
        .await
        .with_context(|| format!("Failed to open database {url}"))
}
