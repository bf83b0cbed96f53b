//! Derivation pass: albums and album covers computed from cataloged tracks.
//!
//! Runs after ingestion has settled, never alongside it, since album grouping
//! reads the complete track set. Both steps rebuild their existence sets from
//! the store on every run, so the pass can be restarted at any point.

mod albums;
mod covers;

pub use albums::{AlbumReport, build_albums};
pub use covers::{CoverDeriver, CoverFailure, CoverReport};

use crate::cover::EncodeError;
use crate::metadata::ParseError;

/// Derivation errors
#[derive(Debug, thiserror::Error)]
pub enum DeriveError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to read tags: {0}")]
    Parse(#[from] ParseError),

    #[error("Failed to encode cover: {0}")]
    Encode(#[from] EncodeError),

    #[error("Timed out")]
    TimedOut,
}
