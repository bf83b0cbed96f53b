//! Pure mapping from parsed tags to catalog records.
//!
//! Nothing here touches the filesystem or the store.

use std::path::{Component, Path};

use crate::config::LibraryConfig;
use crate::metadata::{LyricLine, ParsedTags};
use crate::model::{Track, UNKNOWN_ALBUM, UNKNOWN_ARTIST};

/// A new track plus the candidates for its dependent rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub track: Track,
    /// Artist names, deduplicated, in tag order
    pub artists: Vec<String>,
    /// Tag names inferred from the track's directories
    pub tags: Vec<String>,
    pub lyrics: Vec<LyricLine>,
}

/// Build the track and its dependents for a freshly minted `id`.
pub fn normalize(id: String, path: &Path, parsed: &ParsedTags, library: &LibraryConfig) -> Normalized {
    let (title, artist) = title_artist(path, parsed);
    let artists = artist_candidates(parsed, &artist);

    let track = Track {
        id,
        file_name: file_name(path),
        file_path: path_string(path),
        file_url: file_url(&library.root, path),
        title,
        artist,
        artists: serde_json::to_string(&artists).unwrap_or_else(|_| "[]".to_string()),
        album: non_blank(parsed.album.as_deref()).unwrap_or(UNKNOWN_ALBUM).to_string(),
        year: parsed.year.map(i64::from).unwrap_or(0),
        duration: parsed.duration.unwrap_or(0.0),
        bitrate: parsed.bitrate.map(i64::from).unwrap_or(0),
        sample_rate: parsed.sample_rate.map(i64::from).unwrap_or(0),
    };

    Normalized {
        track,
        artists,
        tags: path_tags(&library.root, path, &library.tag_denylist),
        lyrics: parsed
            .lyrics
            .iter()
            .filter(|l| !l.text.trim().is_empty())
            .cloned()
            .collect(),
    }
}

/// Title and primary artist with their fallbacks: the file name and
/// [`UNKNOWN_ARTIST`].
pub fn title_artist(path: &Path, parsed: &ParsedTags) -> (String, String) {
    let title = non_blank(parsed.title.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| file_name(path));
    let artist = non_blank(parsed.artist.as_deref())
        .unwrap_or(UNKNOWN_ARTIST)
        .to_string();
    (title, artist)
}

/// Explicit artist list if the parser gave one, else the primary artist.
pub fn artist_candidates(parsed: &ParsedTags, primary: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in parsed.artists.iter().map(|a| a.trim()) {
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    if names.is_empty() {
        names.push(primary.to_string());
    }
    names
}

/// Directory names between `root` and the file, minus the denylist.
///
/// The denylist is matched case-insensitively.
pub fn path_tags(root: &Path, path: &Path, denylist: &[String]) -> Vec<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let Some(dir) = relative.parent() else {
        return Vec::new();
    };

    let mut tags: Vec<String> = Vec::new();
    for component in dir.components() {
        let Component::Normal(segment) = component else {
            continue;
        };
        let segment = segment.to_string_lossy();
        let segment = segment.trim();
        if segment.is_empty() || denylist.iter().any(|d| d.eq_ignore_ascii_case(segment)) {
            continue;
        }
        if !tags.iter().any(|t| t == segment) {
            tags.push(segment.to_string());
        }
    }
    tags
}

/// Path relative to `root`, `/` separated with a leading `/`.
///
/// Paths outside `root` keep their full form.
pub fn file_url(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => {
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            format!("/{}", parts.join("/"))
        }
        Err(_) => path_string(path),
    }
}

/// Path as stored in `file_path`: lossy UTF-8, `/` separated.
///
/// Only Windows separators are rewritten; elsewhere `\` is an ordinary
/// file name character.
pub fn path_string(path: &Path) -> String {
    let path = path.to_string_lossy();
    if cfg!(windows) {
        path.replace('\\', "/")
    } else {
        path.into_owned()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_string(path))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
