//! Library import command.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

use super::open_pool;
use crate::config::Config;
use crate::import::Importer;
use crate::metadata::LoftyTagReader;

/// Catalog every audio file under the music root
pub fn cmd_import(
    rt: &Runtime,
    mut config: Config,
    root: Option<PathBuf>,
    chunk_size: Option<usize>,
    timeout: Option<u64>,
) -> anyhow::Result<()> {
    if let Some(root) = root {
        config.library.root = root;
    }
    if let Some(chunk_size) = chunk_size {
        config.import.chunk_size = chunk_size;
    }
    if let Some(timeout) = timeout {
        config.import.task_timeout_secs = timeout;
    }
    // Stored paths are absolute
    config.library.root = std::path::absolute(&config.library.root)?;

    rt.block_on(async {
        let pool = open_pool(&config).await?;
        println!("Importing from: {}", config.library.root.display());

        let importer = Importer::new(
            pool,
            Arc::new(LoftyTagReader),
            config.library.clone(),
            config.import.clone(),
        );
        let report = importer.import_directory().await?;

        println!(
            "\nSeen: {}  Imported: {}  Already cataloged: {} ({} by path, {} by title/artist)  Failed: {}",
            report.seen,
            report.imported,
            report.already_cataloged(),
            report.cataloged_by_path,
            report.cataloged_by_title_artist,
            report.failures.len()
        );
        if report.excluded > 0 {
            println!("Skipped {} non-audio files", report.excluded);
        }
        if report.dependent_failures > 0 {
            println!(
                "{} tag/lyric/artist rows could not be written (see log)",
                report.dependent_failures
            );
        }

        for failure in &report.failures {
            match &failure.title {
                Some(title) => eprintln!(
                    "FAILED: {} (\"{}\"): {}",
                    failure.path.display(),
                    title,
                    failure.error
                ),
                None => eprintln!("FAILED: {}: {}", failure.path.display(), failure.error),
            }
        }
        Ok::<_, anyhow::Error>(())
    })
}
