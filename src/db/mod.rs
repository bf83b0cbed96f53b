//! Database module for catalog persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Provides async operations for:
//! - Track existence checks and inserts
//! - Get-or-create for artists, tags and albums
//! - Append-only writes for link tables, lyrics and covers
//! - Batch path rewrites
//!
//! Every get-or-create is an `INSERT ... ON CONFLICT DO NOTHING` followed by a
//! lookup on the unique key, so concurrent callers always converge on one row.
//!
//! # Example
//!
//! ```ignore
//! use musicflow_catalog::db::{init_db, get_all_tracks};
//!
//! let pool = init_db("sqlite:musicflow.db").await?;
//! let tracks = get_all_tracks(&pool).await?;
//! ```

use std::str::FromStr;
use std::time::Duration;

use crate::model::{Album, AlbumTrack, Artist, CoverKind, NewCover, Tag, Track};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "musicflow.db";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, enables WAL so readers and
/// the writer don't block each other, and runs all pending migrations.
///
/// # Errors
///
/// Returns an error if:
/// - The URL is malformed
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

// ============================================================================
// Tracks
// ============================================================================

const TRACK_COLUMNS: &str = "id, file_name, file_path, file_url, title, artist, artists, \
                             album, year, duration, bitrate, sample_rate";

/// Look up a track by its exact absolute path.
pub async fn get_track_by_path(pool: &SqlitePool, file_path: &str) -> sqlx::Result<Option<Track>> {
    sqlx::query_as::<_, Track>(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks WHERE file_path = ?"
    ))
    .bind(file_path)
    .fetch_optional(pool)
    .await
}

/// Look up a track by exact title and primary artist.
pub async fn get_track_by_title_artist(
    pool: &SqlitePool,
    title: &str,
    artist: &str,
) -> sqlx::Result<Option<Track>> {
    sqlx::query_as::<_, Track>(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks WHERE title = ? AND artist = ?"
    ))
    .bind(title)
    .bind(artist)
    .fetch_optional(pool)
    .await
}

/// Check whether a track id is already taken.
pub async fn track_id_exists(pool: &SqlitePool, id: &str) -> sqlx::Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM tracks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Insert a new track record.
///
/// Tracks are never upserted: a conflict on `id`, `file_path` or
/// (`title`, `artist`) is returned as an error.
pub async fn insert_track(pool: &SqlitePool, track: &Track) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tracks (id, file_name, file_path, file_url, title, artist, artists,
                            album, year, duration, bitrate, sample_rate)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&track.id)
    .bind(&track.file_name)
    .bind(&track.file_path)
    .bind(&track.file_url)
    .bind(&track.title)
    .bind(&track.artist)
    .bind(&track.artists)
    .bind(&track.album)
    .bind(track.year)
    .bind(track.duration)
    .bind(track.bitrate)
    .bind(track.sample_rate)
    .execute(pool)
    .await?;
    Ok(())
}

/// Get all tracks from the database, in insertion order.
pub async fn get_all_tracks(pool: &SqlitePool) -> sqlx::Result<Vec<Track>> {
    sqlx::query_as::<_, Track>(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks ORDER BY rowid"
    ))
    .fetch_all(pool)
    .await
}

/// Batch update track paths in a single transaction.
///
/// Each update is `(id, file_path, file_url)`. Returns the number of rows
/// that actually changed.
pub async fn batch_update_track_paths(
    pool: &SqlitePool,
    updates: &[(String, String, String)],
) -> sqlx::Result<usize> {
    let mut tx = pool.begin().await?;
    let mut success_count = 0;

    for (track_id, file_path, file_url) in updates {
        let result = sqlx::query("UPDATE tracks SET file_path = ?, file_url = ? WHERE id = ?")
            .bind(file_path)
            .bind(file_url)
            .bind(track_id)
            .execute(&mut *tx)
            .await?;
        success_count += result.rows_affected() as usize;
    }

    tx.commit().await?;
    Ok(success_count)
}

// ============================================================================
// Artists and tags
// ============================================================================

/// Get or create an artist by name.
///
/// Idempotent: calling with the same name always returns the same row, also
/// when several callers race on the same new name.
pub async fn get_or_create_artist(pool: &SqlitePool, name: &str) -> sqlx::Result<Artist> {
    sqlx::query("INSERT INTO artists (name, cover, description) VALUES (?, '', '') ON CONFLICT(name) DO NOTHING")
        .bind(name)
        .execute(pool)
        .await?;

    sqlx::query_as::<_, Artist>("SELECT id, name, cover, description FROM artists WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
}

/// Get or create a tag by name. Colors only apply to newly created tags.
pub async fn get_or_create_tag(
    pool: &SqlitePool,
    name: &str,
    color: &str,
    text_color: &str,
) -> sqlx::Result<Tag> {
    sqlx::query(
        "INSERT INTO tags (name, color, text_color) VALUES (?, ?, ?) ON CONFLICT(name) DO NOTHING",
    )
    .bind(name)
    .bind(color)
    .bind(text_color)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, Tag>("SELECT id, name, color, text_color FROM tags WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
}

pub async fn insert_artist_track(
    pool: &SqlitePool,
    artist_id: i64,
    track_id: &str,
) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO artist_tracks (artist_id, track_id) VALUES (?, ?)")
        .bind(artist_id)
        .bind(track_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn insert_track_tag(pool: &SqlitePool, track_id: &str, tag_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO track_tags (track_id, tag_id) VALUES (?, ?)")
        .bind(track_id)
        .bind(tag_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Append one lyric line, returning its row id.
pub async fn insert_lyric(
    pool: &SqlitePool,
    track_id: &str,
    time: f64,
    text: &str,
) -> sqlx::Result<i64> {
    let result = sqlx::query("INSERT INTO lyrics (track_id, time, text) VALUES (?, ?, ?)")
        .bind(track_id)
        .bind(time)
        .bind(text)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

// ============================================================================
// Albums
// ============================================================================

pub async fn get_all_albums(pool: &SqlitePool) -> sqlx::Result<Vec<Album>> {
    sqlx::query_as::<_, Album>("SELECT id, name, year, artist, description FROM albums")
        .fetch_all(pool)
        .await
}

/// Insert an album unless (`name`, `artist`) already exists.
///
/// Returns `true` if a row was created.
pub async fn insert_album(
    pool: &SqlitePool,
    name: &str,
    artist: &str,
    year: i64,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO albums (name, year, artist, description) VALUES (?, ?, ?, '')
        ON CONFLICT(name, artist) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(year)
    .bind(artist)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// All album-track links, oldest first.
pub async fn get_all_album_tracks(pool: &SqlitePool) -> sqlx::Result<Vec<AlbumTrack>> {
    sqlx::query_as::<_, AlbumTrack>(
        "SELECT album_id, track_id, album_name, track_artist, track_title FROM album_tracks ORDER BY id",
    )
    .fetch_all(pool)
    .await
}

/// Insert an album-track link unless the identical tuple exists.
///
/// Returns `true` if a row was created.
pub async fn insert_album_track(pool: &SqlitePool, link: &AlbumTrack) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO album_tracks (album_id, track_id, album_name, track_artist, track_title)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(album_name, track_artist, track_title, track_id) DO NOTHING
        "#,
    )
    .bind(link.album_id)
    .bind(&link.track_id)
    .bind(&link.album_name)
    .bind(&link.track_artist)
    .bind(&link.track_title)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Covers
// ============================================================================

/// Ids that already have at least one cover of the given kind.
pub async fn get_covered_link_ids(pool: &SqlitePool, kind: CoverKind) -> sqlx::Result<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT DISTINCT link_id FROM covers WHERE kind = ?")
        .bind(kind.as_str())
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Insert every variant of one cover in a single transaction.
///
/// Variants whose (`kind`, `link_id`, `size`) exists are skipped. Either all
/// new rows are committed or none are, so a link never ends up with a
/// partial set. Returns the number of rows created.
pub async fn insert_covers(pool: &SqlitePool, covers: &[NewCover]) -> sqlx::Result<usize> {
    let mut tx = pool.begin().await?;
    let mut created = 0;

    for cover in covers {
        let result = sqlx::query(
            r#"
            INSERT INTO covers (kind, link_id, format, size, width, height, base64)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(kind, link_id, size) DO NOTHING
            "#,
        )
        .bind(cover.kind.as_str())
        .bind(cover.link_id)
        .bind(&cover.format)
        .bind(&cover.size)
        .bind(cover.width)
        .bind(cover.height)
        .bind(&cover.base64)
        .execute(&mut *tx)
        .await?;
        created += result.rows_affected() as usize;
    }

    tx.commit().await?;
    Ok(created)
}

// ============================================================================
// Stats
// ============================================================================

/// Row counts for every catalog table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub tracks: i64,
    pub artists: i64,
    pub artist_tracks: i64,
    pub tags: i64,
    pub track_tags: i64,
    pub lyrics: i64,
    pub albums: i64,
    pub album_tracks: i64,
    pub covers: i64,
}

pub async fn catalog_stats(pool: &SqlitePool) -> sqlx::Result<CatalogStats> {
    Ok(CatalogStats {
        tracks: count_rows(pool, "tracks").await?,
        artists: count_rows(pool, "artists").await?,
        artist_tracks: count_rows(pool, "artist_tracks").await?,
        tags: count_rows(pool, "tags").await?,
        track_tags: count_rows(pool, "track_tags").await?,
        lyrics: count_rows(pool, "lyrics").await?,
        albums: count_rows(pool, "albums").await?,
        album_tracks: count_rows(pool, "album_tracks").await?,
        covers: count_rows(pool, "covers").await?,
    })
}

async fn count_rows(pool: &SqlitePool, table: &'static str) -> sqlx::Result<i64> {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(count)
}
