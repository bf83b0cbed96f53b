//! Album materialization.

use std::collections::{HashMap, HashSet};

use sqlx::SqlitePool;

use super::DeriveError;
use crate::db;
use crate::model::{AlbumTrack, Track, UNKNOWN_ALBUM};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlbumReport {
    pub albums_created: usize,
    pub album_tracks_created: usize,
    /// Tracks without a usable album name
    pub tracks_without_album: usize,
}

/// Group tracks into albums by (album name, artist) and link them.
///
/// Existing albums and links are bulk-fetched up front so that each track
/// costs no extra lookup. Tracks with an empty or unknown album name are
/// skipped.
pub async fn build_albums(pool: &SqlitePool) -> Result<AlbumReport, DeriveError> {
    let tracks = db::get_all_tracks(pool).await?;
    let mut report = AlbumReport::default();

    let mut album_ids = album_index(pool).await?;

    let mut grouped: Vec<&Track> = Vec::with_capacity(tracks.len());
    for track in &tracks {
        if album_name(track).is_none() {
            report.tracks_without_album += 1;
            continue;
        }
        grouped.push(track);
    }

    let mut missing = false;
    for track in &grouped {
        let key = (track.album.clone(), track.artist.clone());
        if album_ids.contains_key(&key) {
            continue;
        }
        if db::insert_album(pool, &track.album, &track.artist, track.year).await? {
            report.albums_created += 1;
            tracing::debug!(album = %track.album, artist = %track.artist, "Album created");
        }
        // Placeholder until the ids are re-read below
        album_ids.insert(key, 0);
        missing = true;
    }
    if missing {
        album_ids = album_index(pool).await?;
    }

    let mut linked: HashSet<(String, String, String, String)> = db::get_all_album_tracks(pool)
        .await?
        .iter()
        .map(AlbumTrack::dedup_key)
        .collect();

    for track in grouped {
        let Some(&album_id) = album_ids.get(&(track.album.clone(), track.artist.clone())) else {
            continue;
        };
        let link = AlbumTrack {
            album_id,
            track_id: track.id.clone(),
            album_name: track.album.clone(),
            track_artist: track.artist.clone(),
            track_title: track.title.clone(),
        };
        if !linked.insert(link.dedup_key()) {
            continue;
        }
        if db::insert_album_track(pool, &link).await? {
            report.album_tracks_created += 1;
        }
    }

    tracing::info!(
        albums = report.albums_created,
        album_tracks = report.album_tracks_created,
        without_album = report.tracks_without_album,
        "Albums built"
    );
    Ok(report)
}

async fn album_index(pool: &SqlitePool) -> sqlx::Result<HashMap<(String, String), i64>> {
    Ok(db::get_all_albums(pool)
        .await?
        .into_iter()
        .map(|a| ((a.name, a.artist), a.id))
        .collect())
}

fn album_name(track: &Track) -> Option<&str> {
    let name = track.album.trim();
    (!name.is_empty() && name != UNKNOWN_ALBUM).then_some(name)
}
