//! Catalog statistics command.

use tokio::runtime::Runtime;

use super::open_pool;
use crate::config::Config;
use crate::db;

/// Print row counts per table
pub fn cmd_stats(rt: &Runtime, config: &Config) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_pool(config).await?;
        let stats = db::catalog_stats(&pool).await?;

        println!("tracks        {}", stats.tracks);
        println!("artists       {}", stats.artists);
        println!("artist_tracks {}", stats.artist_tracks);
        println!("tags          {}", stats.tags);
        println!("track_tags    {}", stats.track_tags);
        println!("lyrics        {}", stats.lyrics);
        println!("albums        {}", stats.albums);
        println!("album_tracks  {}", stats.album_tracks);
        println!("covers        {}", stats.covers);
        Ok::<_, anyhow::Error>(())
    })
}
