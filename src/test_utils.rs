//! Test utilities and fixtures for catalog tests.
//!
//! This module provides common test helpers, mock factories, fake
//! collaborators and database utilities to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{temp_db, mock_track};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     db::insert_track(&pool, &mock_track("id1", "/m/a.mp3", "A", "X")).await.unwrap();
//!     // ... test logic
//! }
//! ```

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::cover::{CoverEncoder, EncodeError, EncodedImage, VariantSpec};
use crate::metadata::{ParseError, ParsedTags, TagReader};
use crate::model::Track;

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// # Returns
///
/// A tuple of (connection pool, temp directory handle).
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Creates a mock Track with the given identity and sensible defaults.
///
/// The album is left empty; customize with struct update syntax:
///
/// ```ignore
/// let track = Track {
///     album: "Record".to_string(),
///     ..mock_track("id1", "/m/a.mp3", "A", "X")
/// };
/// ```
pub fn mock_track(id: &str, path: &str, title: &str, artist: &str) -> Track {
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Track {
        id: id.to_string(),
        file_name: file_name.clone(),
        file_path: path.to_string(),
        file_url: format!("/{file_name}"),
        title: title.to_string(),
        artist: artist.to_string(),
        artists: serde_json::to_string(&[artist]).expect("artists serialize"),
        album: String::new(),
        year: 2023,
        duration: 180.0,
        bitrate: 320,
        sample_rate: 44100,
    }
}

/// Tag reader that treats file contents as JSON-encoded [`ParsedTags`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeTagReader;

impl TagReader for FakeTagReader {
    fn read(&self, bytes: &[u8]) -> Result<ParsedTags, ParseError> {
        serde_json::from_slice(bytes).map_err(|e| ParseError::Invalid(e.to_string()))
    }
}

/// [`FakeTagReader`] that blocks for `delay` before returning tags whose
/// title is `stall_title`.
#[derive(Debug, Clone)]
pub struct StallingTagReader {
    pub stall_title: String,
    pub delay: Duration,
}

impl TagReader for StallingTagReader {
    fn read(&self, bytes: &[u8]) -> Result<ParsedTags, ParseError> {
        let parsed = FakeTagReader.read(bytes)?;
        if parsed.title.as_deref() == Some(self.stall_title.as_str()) {
            std::thread::sleep(self.delay);
        }
        Ok(parsed)
    }
}

/// Writes a fake audio file (JSON tags, see [`FakeTagReader`]) under `root`.
///
/// Parent directories are created as needed. Returns the absolute path.
pub fn write_fake_audio(root: &Path, relative: &str, tags: &ParsedTags) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create directories");
    }
    let json = serde_json::to_vec(tags).expect("tags serialize");
    std::fs::write(&path, json).expect("Failed to write fake audio file");
    path
}

/// Encoder that skips real image work: output bytes name the variant and the
/// geometry is the variant's. Empty input is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeEncoder;

impl CoverEncoder for FakeEncoder {
    fn encode(&self, data: &[u8], variant: &VariantSpec) -> Result<EncodedImage, EncodeError> {
        if data.is_empty() {
            return Err(EncodeError::Task("empty image".to_string()));
        }
        Ok(EncodedImage {
            data: format!("{}:{}", variant.name, data.len()).into_bytes(),
            format: "jpeg".to_string(),
            width: variant.width,
            height: variant.height,
        })
    }
}

/// A solid-color PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 90]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;

        // Should be able to query
        let tracks = crate::db::get_all_tracks(&pool).await.unwrap();
        assert!(tracks.is_empty());
    }

    #[test]
    fn test_mock_track_defaults() {
        let track = mock_track("abc", "/music/song.flac", "Song", "Artist");
        assert_eq!(track.id, "abc");
        assert_eq!(track.file_name, "song.flac");
        assert_eq!(track.artists, r#"["Artist"]"#);
        assert!(track.album.is_empty());
    }

    #[test]
    fn test_fake_audio_round_trips_through_reader() {
        let dir = tempfile::tempdir().unwrap();
        let tags = ParsedTags {
            title: Some("T".into()),
            ..Default::default()
        };
        let path = write_fake_audio(dir.path(), "a/b/c.mp3", &tags);

        let bytes = std::fs::read(path).unwrap();
        assert_eq!(FakeTagReader.read(&bytes).unwrap(), tags);
        assert!(FakeTagReader.read(b"garbage").is_err());
    }
}
