//! Album cover extraction.
//!
//! For every album without covers, the first linked track (in link order) is
//! read, its first embedded picture is encoded into every configured variant
//! and one cover row per variant is stored. An album whose first track has no
//! picture is not retried from another track in the same run.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use parking_lot::Mutex;
use sqlx::SqlitePool;

use super::DeriveError;
use crate::batch::BatchExecutor;
use crate::config::CoverConfig;
use crate::cover::{self, CoverEncoder};
use crate::db;
use crate::metadata::{self, TagReader};
use crate::model::{CoverKind, NewCover};

/// One album to cover, with the track chosen to supply the art.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CoverJob {
    album_id: i64,
    track_id: String,
    path: PathBuf,
}

enum CoverOutcome {
    Written(usize),
    NoPicture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverFailure {
    pub album_id: i64,
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverReport {
    /// Albums that had no covers at the start of the run
    pub albums_considered: usize,
    pub covers_created: usize,
    pub albums_without_art: usize,
    pub failures: Vec<CoverFailure>,
}

impl CoverReport {
    fn record(&mut self, job: &CoverJob, result: Result<CoverOutcome, DeriveError>) {
        match result {
            Ok(CoverOutcome::Written(n)) => self.covers_created += n,
            Ok(CoverOutcome::NoPicture) => self.albums_without_art += 1,
            Err(e) => {
                tracing::warn!(
                    album_id = job.album_id,
                    path = %job.path.display(),
                    "Cover extraction failed: {}", e
                );
                self.failures.push(CoverFailure {
                    album_id: job.album_id,
                    path: job.path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Derives album covers from embedded pictures.
pub struct CoverDeriver {
    pool: SqlitePool,
    reader: Arc<dyn TagReader>,
    encoder: Arc<dyn CoverEncoder>,
    config: CoverConfig,
}

impl CoverDeriver {
    pub fn new(
        pool: SqlitePool,
        reader: Arc<dyn TagReader>,
        encoder: Arc<dyn CoverEncoder>,
        config: CoverConfig,
    ) -> Self {
        Self {
            pool,
            reader,
            encoder,
            config,
        }
    }

    pub async fn run(&self) -> Result<CoverReport, DeriveError> {
        let jobs = self.select_jobs().await?;
        let report = Mutex::new(CoverReport {
            albums_considered: jobs.len(),
            ..Default::default()
        });

        let executor = BatchExecutor::new(self.config.chunk_size)
            .with_task_timeout(self.config.task_timeout());

        let stats = {
            let report = &report;
            executor
                .run("covers", jobs.clone(), |job| async move {
                    let result = self.derive_one(&job).await;
                    report.lock().record(&job, result);
                })
                .await
        };

        let mut report = report.into_inner();
        for index in stats.timed_out {
            if let Some(job) = jobs.get(index) {
                report.record(job, Err(DeriveError::TimedOut));
            }
        }

        tracing::info!(
            albums = report.albums_considered,
            covers = report.covers_created,
            without_art = report.albums_without_art,
            failed = report.failures.len(),
            "Covers derived"
        );
        Ok(report)
    }

    /// First track of every album that has no covers yet.
    ///
    /// Albums are marked visited as they are selected, so each album yields
    /// at most one job.
    async fn select_jobs(&self) -> Result<Vec<CoverJob>, DeriveError> {
        let mut visited: HashSet<i64> = db::get_covered_link_ids(&self.pool, CoverKind::Album)
            .await?
            .into_iter()
            .collect();

        let paths: HashMap<String, String> = db::get_all_tracks(&self.pool)
            .await?
            .into_iter()
            .map(|t| (t.id, t.file_path))
            .collect();

        let mut jobs = Vec::new();
        for link in db::get_all_album_tracks(&self.pool).await? {
            let Some(path) = paths.get(&link.track_id) else {
                continue;
            };
            if visited.insert(link.album_id) {
                jobs.push(CoverJob {
                    album_id: link.album_id,
                    track_id: link.track_id,
                    path: PathBuf::from(path),
                });
            }
        }
        Ok(jobs)
    }

    async fn derive_one(&self, job: &CoverJob) -> Result<CoverOutcome, DeriveError> {
        let parsed = metadata::read_file(Arc::clone(&self.reader), job.path.clone()).await?;
        let Some(picture) = parsed.picture else {
            tracing::debug!(album_id = job.album_id, track_id = %job.track_id, "No embedded picture");
            return Ok(CoverOutcome::NoPicture);
        };

        // Encode every variant before writing any of them
        let images = cover::encode_variants(
            Arc::clone(&self.encoder),
            picture.data,
            self.config.variants.clone(),
        )
        .await?;

        let covers: Vec<NewCover> = images
            .into_iter()
            .map(|(variant, image)| NewCover {
                kind: CoverKind::Album,
                link_id: job.album_id,
                format: image.format,
                size: variant.name,
                width: image.width,
                height: image.height,
                base64: BASE64.encode(&image.data),
            })
            .collect();

        // All variants or none: a partial set would mark the album covered
        let written = db::insert_covers(&self.pool, &covers).await?;
        Ok(CoverOutcome::Written(written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::EmbeddedPicture;
    use crate::derive::build_albums;
    use crate::metadata::ParsedTags;
    use crate::model::{Cover, Track};
    use crate::test_utils::{
        FakeEncoder, FakeTagReader, StallingTagReader, mock_track, temp_db, write_fake_audio,
    };
    use std::path::Path;
    use std::time::Duration;

    fn parsed(title: &str, picture: Option<Vec<u8>>) -> ParsedTags {
        ParsedTags {
            title: Some(title.into()),
            artist: Some("X".into()),
            album: Some("M".into()),
            picture: picture.map(|data| EmbeddedPicture {
                data,
                mime_type: "image/jpeg".into(),
            }),
            ..Default::default()
        }
    }

    async fn catalog(pool: &SqlitePool, root: &Path, id: &str, rel: &str, tags: &ParsedTags) {
        let path = write_fake_audio(root, rel, tags);
        let track = Track {
            album: tags.album.clone().unwrap_or_default(),
            ..mock_track(
                id,
                &path.to_string_lossy(),
                tags.title.as_deref().unwrap_or_default(),
                "X",
            )
        };
        db::insert_track(pool, &track).await.unwrap();
    }

    fn deriver(pool: &SqlitePool) -> CoverDeriver {
        CoverDeriver::new(
            pool.clone(),
            Arc::new(FakeTagReader),
            Arc::new(FakeEncoder),
            CoverConfig::default(),
        )
    }

    async fn covers(pool: &SqlitePool) -> Vec<Cover> {
        sqlx::query_as::<_, Cover>(
            "SELECT id, kind, link_id, format, size, width, height, base64 FROM covers ORDER BY id",
        )
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_single_shot_cover() {
        let (pool, dir) = temp_db().await;
        let root = dir.path().join("music");
        catalog(&pool, &root, "t1", "1.mp3", &parsed("A", Some(vec![7; 32]))).await;
        catalog(&pool, &root, "t2", "2.mp3", &parsed("B", None)).await;
        catalog(&pool, &root, "t3", "3.mp3", &parsed("C", None)).await;
        build_albums(&pool).await.unwrap();

        let report = deriver(&pool).run().await.unwrap();
        assert_eq!(report.albums_considered, 1);
        assert_eq!(report.covers_created, 2);
        assert!(report.failures.is_empty());

        let rows = covers(&pool).await;
        let album = &db::get_all_albums(&pool).await.unwrap()[0];
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|c| c.link_id == album.id && c.kind == "album"));
        assert_eq!(rows[0].size, "small");
        assert_eq!((rows[0].width, rows[0].height), (140, 140));
        assert_eq!(rows[1].size, "medium");
        assert_eq!((rows[1].width, rows[1].height), (600, 600));
        assert!(BASE64.decode(&rows[0].base64).is_ok());

        // The album is covered now: nothing more is produced
        let report = deriver(&pool).run().await.unwrap();
        assert_eq!(report.albums_considered, 0);
        assert_eq!(covers(&pool).await.len(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_from_other_tracks() {
        let (pool, dir) = temp_db().await;
        let root = dir.path().join("music");
        catalog(&pool, &root, "t1", "1.mp3", &parsed("A", None)).await;
        catalog(&pool, &root, "t2", "2.mp3", &parsed("B", Some(vec![7; 32]))).await;
        build_albums(&pool).await.unwrap();

        let report = deriver(&pool).run().await.unwrap();
        assert_eq!(report.albums_considered, 1);
        assert_eq!(report.albums_without_art, 1);
        assert_eq!(report.covers_created, 0);
        assert!(covers(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_encode_failure_writes_no_variant() {
        let (pool, dir) = temp_db().await;
        let root = dir.path().join("music");
        // FakeEncoder rejects empty pictures
        catalog(&pool, &root, "t1", "1.mp3", &parsed("A", Some(Vec::new()))).await;
        build_albums(&pool).await.unwrap();

        let report = deriver(&pool).run().await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(covers(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_isolated_failure() {
        let (pool, dir) = temp_db().await;
        let root = dir.path().join("music");
        catalog(&pool, &root, "t1", "1.mp3", &parsed("A", Some(vec![1; 8]))).await;
        let mut other = parsed("B", Some(vec![2; 8]));
        other.album = Some("N".into());
        catalog(&pool, &root, "t2", "2.mp3", &other).await;
        build_albums(&pool).await.unwrap();
        std::fs::remove_file(root.join("1.mp3")).unwrap();

        let report = deriver(&pool).run().await.unwrap();
        assert_eq!(report.albums_considered, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.covers_created, 2);
    }

    #[tokio::test]
    async fn test_failed_variant_leaves_album_uncovered() {
        let (pool, dir) = temp_db().await;
        let root = dir.path().join("music");
        catalog(&pool, &root, "t1", "1.mp3", &parsed("A", Some(vec![7; 32]))).await;
        build_albums(&pool).await.unwrap();
        sqlx::query(
            "CREATE TRIGGER no_medium BEFORE INSERT ON covers WHEN NEW.size = 'medium' BEGIN SELECT RAISE(ABORT, 'boom'); END;",
        )
        .execute(&pool)
        .await
        .unwrap();

        let report = deriver(&pool).run().await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.covers_created, 0);
        assert!(covers(&pool).await.is_empty());

        // Once the store accepts writes again the album gets both variants
        sqlx::query("DROP TRIGGER no_medium").execute(&pool).await.unwrap();
        let report = deriver(&pool).run().await.unwrap();
        assert_eq!(report.albums_considered, 1);
        assert_eq!(report.covers_created, 2);
        let sizes: Vec<String> = covers(&pool).await.into_iter().map(|c| c.size).collect();
        assert_eq!(sizes, vec!["small".to_string(), "medium".to_string()]);
    }

    #[tokio::test]
    async fn test_stalled_album_times_out_alone() {
        let (pool, dir) = temp_db().await;
        let root = dir.path().join("music");
        catalog(&pool, &root, "t1", "1.mp3", &parsed("Slow", Some(vec![1; 8]))).await;
        let mut other = parsed("B", Some(vec![2; 8]));
        other.album = Some("N".into());
        catalog(&pool, &root, "t2", "2.mp3", &other).await;
        build_albums(&pool).await.unwrap();

        let slow_album = db::get_all_albums(&pool)
            .await
            .unwrap()
            .into_iter()
            .find(|a| a.name == "M")
            .unwrap();

        let reader = StallingTagReader {
            stall_title: "Slow".into(),
            delay: Duration::from_millis(2500),
        };
        let config = CoverConfig {
            task_timeout_secs: 1,
            ..CoverConfig::default()
        };
        let deriver = CoverDeriver::new(pool.clone(), Arc::new(reader), Arc::new(FakeEncoder), config);

        let report = deriver.run().await.unwrap();
        assert_eq!(report.albums_considered, 2);
        assert_eq!(report.covers_created, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].album_id, slow_album.id);
        assert_eq!(report.failures[0].path, root.join("1.mp3"));
        assert_eq!(report.failures[0].error, DeriveError::TimedOut.to_string());
        assert!(covers(&pool).await.iter().all(|c| c.link_id != slow_album.id));
    }
}
