//! Core data models for the catalog.
//!
//! Defines the stored entities: [`Track`], [`Artist`], [`Tag`],
//! [`Album`], [`AlbumTrack`] and [`Cover`]. Row types derive SQLx's
//! `FromRow` for database mapping.
//!
//! # Database Schema
//!
//! The models map to the tables created by `migrations/0001_catalog.sql`:
//! - `tracks` - one row per cataloged audio file
//! - `artists`, `tags` - named entities with unique names
//! - `artist_tracks`, `track_tags` - link tables
//! - `lyrics` - timed lyric lines per track
//! - `albums`, `album_tracks` - derived from tracks by the album pass
//! - `covers` - resized cover variants linked to an album

use sqlx::FromRow;

/// Sentinel artist used when the tag parser reports none.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Sentinel album used when the tag parser reports none. Never materialized
/// as an [`Album`].
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// A cataloged audio file.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Track {
    /// Short random id, immutable once assigned
    pub id: String,
    /// Base name of the file
    pub file_name: String,
    /// Absolute file path (unique)
    pub file_path: String,
    /// Path relative to the music root, `/` separated
    pub file_url: String,
    pub title: String,
    /// Primary display artist
    pub artist: String,
    /// JSON array of contributing artist names
    pub artists: String,
    pub album: String,
    pub year: i64,
    /// Duration in seconds
    pub duration: f64,
    pub bitrate: i64,
    pub sample_rate: i64,
}

/// An artist, unique by name.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Artist {
    /// Database ID (auto-generated)
    pub id: i64,
    pub name: String,
    pub cover: String,
    pub description: String,
}

/// A tag, unique by name. Tags are inferred from directory names.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub text_color: String,
}

/// An album, unique by (`name`, `artist`).
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Album {
    pub id: i64,
    pub name: String,
    pub year: i64,
    /// Display artist string (the track's primary artist)
    pub artist: String,
    pub description: String,
}

/// Link between an album and a track.
///
/// The album name, artist and title are denormalized so duplicate links can
/// be detected without a join.
#[derive(Debug, Clone, PartialEq, Eq, Hash, FromRow)]
pub struct AlbumTrack {
    pub album_id: i64,
    pub track_id: String,
    pub album_name: String,
    pub track_artist: String,
    pub track_title: String,
}

impl AlbumTrack {
    /// The tuple that makes an album-track link unique.
    pub fn dedup_key(&self) -> (String, String, String, String) {
        (
            self.album_name.clone(),
            self.track_artist.clone(),
            self.track_title.clone(),
            self.track_id.clone(),
        )
    }
}

/// What a cover's `link_id` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverKind {
    Album,
    Artist,
}

impl CoverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverKind::Album => "album",
            CoverKind::Artist => "artist",
        }
    }
}

/// A resized cover image variant, ready to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCover {
    pub kind: CoverKind,
    pub link_id: i64,
    pub format: String,
    /// Named variant, e.g. "small" or "medium"
    pub size: String,
    pub width: u32,
    pub height: u32,
    pub base64: String,
}

/// A stored cover row.
#[derive(Debug, Clone, FromRow)]
pub struct Cover {
    pub id: i64,
    pub kind: String,
    pub link_id: i64,
    pub format: String,
    pub size: String,
    pub width: i64,
    pub height: i64,
    pub base64: String,
}
