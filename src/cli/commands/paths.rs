//! Path rewrite command.

use tokio::runtime::Runtime;

use super::open_pool;
use crate::config::Config;
use crate::db;
use crate::relocate;

/// Rewrite stored paths from one root to another
pub fn cmd_rewrite_paths(
    rt: &Runtime,
    config: &Config,
    from: &str,
    to: &str,
    dry_run: bool,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_pool(config).await?;
        let tracks = db::get_all_tracks(&pool).await?;
        let rewrites = relocate::plan_rewrite(&tracks, from, to);

        println!("{} of {} tracks to rewrite", rewrites.len(), tracks.len());

        if dry_run {
            println!("\n[DRY RUN MODE - Nothing will be written]\n");
            for rewrite in &rewrites {
                println!("WOULD REWRITE: {} -> {}", rewrite.old_path, rewrite.file_path);
            }
            return Ok(());
        }

        let updated = relocate::apply_rewrite(&pool, &rewrites).await?;
        println!("Updated {} tracks", updated);
        Ok::<_, anyhow::Error>(())
    })
}
