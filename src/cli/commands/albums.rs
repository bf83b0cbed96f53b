//! Album and cover derivation command.

use std::sync::Arc;
use tokio::runtime::Runtime;

use super::open_pool;
use crate::config::Config;
use crate::cover::ImageResizer;
use crate::derive::{CoverDeriver, build_albums};
use crate::metadata::LoftyTagReader;

/// Build albums, then extract covers for albums that have none
pub fn cmd_albums(
    rt: &Runtime,
    mut config: Config,
    skip_covers: bool,
    chunk_size: Option<usize>,
) -> anyhow::Result<()> {
    if let Some(chunk_size) = chunk_size {
        config.covers.chunk_size = chunk_size;
    }

    rt.block_on(async {
        let pool = open_pool(&config).await?;

        let albums = build_albums(&pool).await?;
        println!(
            "Albums created: {}  Album tracks linked: {}  Tracks without album: {}",
            albums.albums_created, albums.album_tracks_created, albums.tracks_without_album
        );

        if skip_covers {
            return Ok(());
        }

        let deriver = CoverDeriver::new(
            pool,
            Arc::new(LoftyTagReader),
            Arc::new(ImageResizer),
            config.covers.clone(),
        );
        let covers = deriver.run().await?;
        println!(
            "Albums needing covers: {}  Covers created: {}  Without art: {}  Failed: {}",
            covers.albums_considered,
            covers.covers_created,
            covers.albums_without_art,
            covers.failures.len()
        );
        for failure in &covers.failures {
            eprintln!(
                "FAILED: album {} from {}: {}",
                failure.album_id,
                failure.path.display(),
                failure.error
            );
        }
        Ok::<_, anyhow::Error>(())
    })
}
