//! Catalog writes for one imported file.
//!
//! The track row is the unit of "this file is cataloged". Tags, lyrics and
//! artists hang off it and are written best-effort: a failing dependent row
//! is logged and counted, never rolled back into the track.

use sqlx::SqlitePool;

use super::normalize::Normalized;
use crate::config::LibraryConfig;
use crate::db;
use crate::model::Track;

/// Dependent rows written for one track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub tags: usize,
    pub lyrics: usize,
    pub artists: usize,
    /// Dependent rows that failed to write
    pub dependent_failures: usize,
}

pub async fn insert_track(pool: &SqlitePool, track: &Track) -> sqlx::Result<()> {
    db::insert_track(pool, track).await
}

/// Write tags, lyrics and artists for an already inserted track, in that
/// order.
pub async fn write_dependents(
    pool: &SqlitePool,
    normalized: &Normalized,
    library: &LibraryConfig,
) -> WriteSummary {
    let track_id = normalized.track.id.as_str();
    let mut summary = WriteSummary::default();

    for name in &normalized.tags {
        let result = async {
            let tag =
                db::get_or_create_tag(pool, name, &library.tag_color, &library.tag_text_color)
                    .await?;
            db::insert_track_tag(pool, track_id, tag.id).await
        }
        .await;
        match result {
            Ok(()) => summary.tags += 1,
            Err(e) => {
                tracing::warn!(track_id, tag = %name, "Failed to write tag: {}", e);
                summary.dependent_failures += 1;
            }
        }
    }

    for line in &normalized.lyrics {
        match db::insert_lyric(pool, track_id, line.time, &line.text).await {
            Ok(_) => summary.lyrics += 1,
            Err(e) => {
                tracing::warn!(track_id, time = line.time, "Failed to write lyric line: {}", e);
                summary.dependent_failures += 1;
            }
        }
    }

    for name in &normalized.artists {
        let result = async {
            let artist = db::get_or_create_artist(pool, name).await?;
            db::insert_artist_track(pool, artist.id, track_id).await
        }
        .await;
        match result {
            Ok(()) => summary.artists += 1,
            Err(e) => {
                tracing::warn!(track_id, artist = %name, "Failed to write artist: {}", e);
                summary.dependent_failures += 1;
            }
        }
    }

    summary
}
