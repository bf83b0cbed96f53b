//! Audio file metadata reading.
//!
//! Uses the lofty crate for format-independent metadata access.
//! Supports MP3, FLAC, OGG, M4A, APE and WAV files.
//!
//! Parsing works on raw file bytes rather than paths so that the import
//! pipeline can read the file once and hand the bytes to any [`TagReader`].
//! Tests plug in a fake reader; [`LoftyTagReader`] is the real one.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey};
use serde::{Deserialize, Serialize};

use crate::cover::{EmbeddedPicture, first_picture};

/// Everything the pipeline wants from a file's tags.
///
/// Every field is optional; the import pipeline supplies defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Explicit list of contributing artists, possibly empty
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub year: Option<u32>,
    pub track: Option<u32>,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Audio bitrate in kbps
    pub bitrate: Option<u32>,
    pub sample_rate: Option<u32>,
    pub lyrics: Vec<LyricLine>,
    pub picture: Option<EmbeddedPicture>,
}

/// A single timed lyric line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Offset in seconds
    pub time: f64,
    pub text: String,
}

/// Tag parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read tags: {0}")]
    Tags(#[from] lofty::error::LoftyError),

    #[error("Invalid tag data: {0}")]
    Invalid(String),

    #[error("Parser task failed: {0}")]
    Task(String),
}

/// Turns raw audio file bytes into [`ParsedTags`].
pub trait TagReader: Send + Sync {
    fn read(&self, bytes: &[u8]) -> Result<ParsedTags, ParseError>;
}

/// [`TagReader`] backed by lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read(&self, bytes: &[u8]) -> Result<ParsedTags, ParseError> {
        // Probe the bytes to determine format and read tags
        let tagged_file = Probe::new(Cursor::new(bytes)).guess_file_type()?.read()?;

        // Get the primary tag, or fall back to the first available tag
        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());

        let properties = tagged_file.properties();
        let duration = properties.duration().as_secs_f64();

        let mut parsed = ParsedTags {
            duration: (duration > 0.0).then_some(duration),
            bitrate: properties.audio_bitrate(),
            sample_rate: properties.sample_rate(),
            ..Default::default()
        };

        let Some(tag) = tag else {
            return Ok(parsed);
        };

        parsed.title = tag.title().map(|s| s.to_string());
        parsed.artist = tag.artist().map(|s| s.to_string());
        parsed.album = tag.album().map(|s| s.to_string());
        parsed.year = tag.year();
        parsed.track = tag.track();
        parsed.artists = tag
            .get_strings(&ItemKey::TrackArtist)
            .map(str::to_string)
            .collect();
        parsed.lyrics = tag
            .get_string(&ItemKey::Lyrics)
            .map(parse_lrc)
            .unwrap_or_default();
        parsed.picture = first_picture(tag);

        Ok(parsed)
    }
}

/// Read a file and parse its tags on the blocking pool.
pub async fn read_file(reader: Arc<dyn TagReader>, path: PathBuf) -> Result<ParsedTags, ParseError> {
    tokio::task::spawn_blocking(move || {
        let bytes = std::fs::read(&path)?;
        reader.read(&bytes)
    })
    .await
    .map_err(|e| ParseError::Task(e.to_string()))?
}

// ============================================================================
// LRC lyrics
// ============================================================================

/// Parse LRC-style lyrics.
///
/// `[mm:ss.xx]text` lines become timed lines; a line may carry several time
/// tags. Lines with no time tag are kept at offset 0. Header tags such as
/// `[ar:...]` and blank lines are dropped.
pub fn parse_lrc(text: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();

    for raw in text.lines() {
        let mut rest = raw.trim();
        let mut times = Vec::new();

        while let Some(after) = rest.strip_prefix('[') {
            let Some(end) = after.find(']') else { break };
            let Some(time) = parse_timestamp(&after[..end]) else {
                break;
            };
            times.push(time);
            rest = after[end + 1..].trim_start();
        }

        let body = rest.trim();
        if body.is_empty() || (times.is_empty() && is_header(body)) {
            continue;
        }

        if times.is_empty() {
            times.push(0.0);
        }
        for time in times {
            lines.push(LyricLine {
                time,
                text: body.to_string(),
            });
        }
    }

    lines
}

/// `mm:ss`, `mm:ss.xx` (centiseconds) or `mm:ss.xxx` (milliseconds).
fn parse_timestamp(s: &str) -> Option<f64> {
    let (minutes, seconds) = s.split_once(':')?;
    let minutes: u32 = minutes.parse().ok()?;

    let (whole, fraction) = match seconds.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (seconds, None),
    };
    let whole: u32 = whole.parse().ok()?;

    let fraction = match fraction {
        Some(f) if !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()) => {
            let digits: f64 = f.parse().ok()?;
            digits / 10f64.powi(f.len() as i32)
        }
        Some(_) => return None,
        None => 0.0,
    };

    Some(f64::from(minutes) * 60.0 + f64::from(whole) + fraction)
}

fn is_header(line: &str) -> bool {
    line.starts_with('[') && line.ends_with(']') && line.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_non_audio_bytes_returns_error() {
        let result = LoftyTagReader.read(b"This is not an audio file");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_read_file_missing_returns_io_error() {
        let reader: Arc<dyn TagReader> = Arc::new(LoftyTagReader);
        let result = read_file(reader, PathBuf::from("/nonexistent/path/to/file.mp3")).await;
        assert!(matches!(result, Err(ParseError::Io(_))));
    }

    #[tokio::test]
    async fn test_read_file_non_audio_returns_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "This is not an audio file").unwrap();

        let reader: Arc<dyn TagReader> = Arc::new(LoftyTagReader);
        let result = read_file(reader, temp_file.path().to_path_buf()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_lrc_basic() {
        let lrc = "[ar:Someone]\n[al:Somewhere]\n[00:00.00]Intro\n[00:02.50]First line\n\n[01:10.25]Later";
        let lines = parse_lrc(lrc);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], LyricLine { time: 0.0, text: "Intro".into() });
        assert!((lines[1].time - 2.5).abs() < 1e-9);
        assert_eq!(lines[1].text, "First line");
        assert!((lines[2].time - 70.25).abs() < 1e-9);
    }

    #[test]
    fn test_parse_lrc_drops_blank_timed_lines() {
        let lines = parse_lrc("[00:01.00]\n[00:02.00]   \n[00:03.00]kept");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "kept");
    }

    #[test]
    fn test_parse_lrc_repeated_time_tags() {
        let lines = parse_lrc("[00:10.00][00:40.00]Chorus");
        assert_eq!(lines.len(), 2);
        assert!((lines[0].time - 10.0).abs() < 1e-9);
        assert!((lines[1].time - 40.0).abs() < 1e-9);
        assert!(lines.iter().all(|l| l.text == "Chorus"));
    }

    #[test]
    fn test_parse_lrc_plain_text_at_zero() {
        let lines = parse_lrc("just words\nmore words");
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.time == 0.0));
    }

    #[test]
    fn test_parse_timestamp_fractions() {
        assert_eq!(parse_timestamp("00:05"), Some(5.0));
        assert!((parse_timestamp("00:05.5").unwrap() - 5.5).abs() < 1e-9);
        assert!((parse_timestamp("00:05.25").unwrap() - 5.25).abs() < 1e-9);
        assert!((parse_timestamp("00:05.125").unwrap() - 5.125).abs() < 1e-9);
        assert_eq!(parse_timestamp("ar:Someone"), None);
        assert_eq!(parse_timestamp("00:05.x"), None);
    }
}
