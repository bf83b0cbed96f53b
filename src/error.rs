//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`
//! ([`ImportError`](crate::import::ImportError),
//! [`ParseError`](crate::metadata::ParseError),
//! [`EncodeError`](crate::cover::EncodeError),
//! [`DeriveError`](crate::derive::DeriveError)), while the CLI uses `anyhow`
//! for convenient error propagation. [`Error`] aggregates the failures that
//! abort a whole command rather than a single file.
//!
//! # Example
//!
//! ```ignore
//! use musicflow_catalog::error::{Result, ResultExt};
//!
//! async fn open(url: &str) -> Result<SqlitePool> {
//!     db::init_db(url).await.with_context("opening catalog")
//! }
//! ```

use std::path::PathBuf;

use crate::config::ConfigError;

/// Result of an operation that aborts the whole command on failure.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that stop a command as a whole. Per-file and per-album problems
/// are recorded in the import and cover reports instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("filesystem access failed: {0}")]
    Io(#[from] std::io::Error),

    /// Opening, migrating or querying the catalog store failed
    #[error("catalog store unavailable: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Music root does not exist or is not a directory
    #[error("music root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// Another error plus a note on what was being attempted
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn root_not_found(path: impl Into<PathBuf>) -> Self {
        Self::RootNotFound(path.into())
    }

    /// Wrap with a note on what was being attempted.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// `with_context` for the failure sources a command meets directly.
pub trait ResultExt<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().context(ctx))
    }
}
