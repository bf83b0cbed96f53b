//! Rewrite stored track paths after the music root moves.
//!
//! Only the catalog is touched; files are never moved. A rewrite is planned
//! first ([`plan_rewrite`], usable as a dry run) and then applied in one
//! transaction keyed by track id. Running it twice changes nothing the
//! second time.

use sqlx::SqlitePool;

use crate::db;
use crate::model::Track;

/// One planned path change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewrite {
    pub track_id: String,
    pub old_path: String,
    pub file_path: String,
    pub file_url: String,
}

/// Compute the new `file_path`/`file_url` of every track under `from`.
///
/// Backslashes are normalized to `/` before matching, so catalogs written on
/// Windows can be moved to a Unix root. Tracks outside `from`, and tracks
/// whose paths would not change, are left out.
pub fn plan_rewrite(tracks: &[Track], from: &str, to: &str) -> Vec<PathRewrite> {
    let from = normalize_root(from);
    let to = normalize_root(to);

    tracks
        .iter()
        .filter_map(|track| {
            let current = track.file_path.replace('\\', "/");
            let rest = strip_root(&current, &from)?;
            let file_path = format!("{to}{rest}");
            let file_url = rest.to_string();

            (file_path != track.file_path || file_url != track.file_url).then(|| PathRewrite {
                track_id: track.id.clone(),
                old_path: track.file_path.clone(),
                file_path,
                file_url,
            })
        })
        .collect()
}

/// Apply planned rewrites, returning the number of tracks updated.
pub async fn apply_rewrite(pool: &SqlitePool, rewrites: &[PathRewrite]) -> sqlx::Result<usize> {
    let updates: Vec<(String, String, String)> = rewrites
        .iter()
        .map(|r| (r.track_id.clone(), r.file_path.clone(), r.file_url.clone()))
        .collect();
    let updated = db::batch_update_track_paths(pool, &updates).await?;
    tracing::info!(planned = rewrites.len(), updated, "Track paths rewritten");
    Ok(updated)
}

/// Plan and apply in one go.
pub async fn rewrite_paths(pool: &SqlitePool, from: &str, to: &str) -> sqlx::Result<usize> {
    let tracks = db::get_all_tracks(pool).await?;
    let rewrites = plan_rewrite(&tracks, from, to);
    apply_rewrite(pool, &rewrites).await
}

fn normalize_root(root: &str) -> String {
    root.replace('\\', "/").trim_end_matches('/').to_string()
}

/// The remainder of `path` after `root`, starting with `/`. `None` unless
/// `root` is a whole-segment prefix.
fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(root)?;
    rest.starts_with('/').then_some(rest)
}
