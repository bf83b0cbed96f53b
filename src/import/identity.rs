//! Existence checks and track id minting.

use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::SqlitePool;

use crate::db;

/// Why a file was skipped as already cataloged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogedBy {
    /// A track with the exact same absolute path exists
    Path,
    /// A track with the exact same (title, artist) exists
    TitleArtist,
}

pub async fn exists_by_path(pool: &SqlitePool, file_path: &str) -> sqlx::Result<bool> {
    Ok(db::get_track_by_path(pool, file_path).await?.is_some())
}

pub async fn exists_by_title_artist(
    pool: &SqlitePool,
    title: &str,
    artist: &str,
) -> sqlx::Result<bool> {
    Ok(db::get_track_by_title_artist(pool, title, artist)
        .await?
        .is_some())
}

/// Random alphanumeric id of `len` characters.
pub fn generate_id(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Draw ids from `generate` until one is free in the store.
///
/// Returns `Ok(None)` when all `attempts` collided.
pub async fn mint_id(
    pool: &SqlitePool,
    attempts: usize,
    mut generate: impl FnMut() -> String,
) -> sqlx::Result<Option<String>> {
    for attempt in 1..=attempts {
        let id = generate();
        if !db::track_id_exists(pool, &id).await? {
            return Ok(Some(id));
        }
        tracing::debug!(id = %id, attempt, "Track id collision");
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_track, temp_db};

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id(9);
        assert_eq!(id.len(), 9);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generate_id(9), generate_id(9));
    }

    #[tokio::test]
    async fn test_existence_checks() {
        let (pool, _dir) = temp_db().await;
        db::insert_track(&pool, &mock_track("abc", "/music/a.mp3", "A", "X"))
            .await
            .unwrap();

        assert!(exists_by_path(&pool, "/music/a.mp3").await.unwrap());
        assert!(!exists_by_path(&pool, "/music/b.mp3").await.unwrap());
        assert!(exists_by_title_artist(&pool, "A", "X").await.unwrap());
        // Exact match only
        assert!(!exists_by_title_artist(&pool, "A", "Y").await.unwrap());
        assert!(!exists_by_title_artist(&pool, "a", "X").await.unwrap());
    }

    #[tokio::test]
    async fn test_mint_retries_past_collisions() {
        let (pool, _dir) = temp_db().await;
        db::insert_track(&pool, &mock_track("taken", "/music/a.mp3", "A", "X"))
            .await
            .unwrap();

        let mut candidates = vec!["free", "taken", "taken"];
        let id = mint_id(&pool, 10, || candidates.pop().unwrap().to_string())
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("free"));
    }

    #[tokio::test]
    async fn test_mint_exhaustion() {
        let (pool, _dir) = temp_db().await;
        db::insert_track(&pool, &mock_track("taken", "/music/a.mp3", "A", "X"))
            .await
            .unwrap();

        let mut calls = 0;
        let id = mint_id(&pool, 10, || {
            calls += 1;
            "taken".to_string()
        })
        .await
        .unwrap();

        assert!(id.is_none());
        assert_eq!(calls, 10);
    }
}
