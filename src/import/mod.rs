//! Track ingestion pipeline.
//!
//! For every audio file:
//! 1. skip it if a track with the same path exists;
//! 2. read and parse its tags;
//! 3. skip it if a track with the same (title, artist) exists;
//! 4. mint an id, normalize and insert the track;
//! 5. write tags, lyrics and artists best-effort.
//!
//! Files are processed through the [`BatchExecutor`]. Steps 3 and 4 run
//! under one admission lock so two concurrent files with the same
//! (title, artist) cannot both be admitted. Outcomes are collected into an
//! [`ImportReport`] shared by all tasks.
//!
//! The per-file timeout covers steps 1 to 3 and id minting. Once the track
//! insert starts, the file runs to completion: a track row without its
//! dependents would be skipped by path on every later run.

pub mod identity;
pub mod normalize;
pub mod writer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use sqlx::SqlitePool;

use crate::batch::BatchExecutor;
use crate::config::{ImportConfig, LibraryConfig};
use crate::error::{Error, ResultExt};
use crate::metadata::{self, ParseError, TagReader};
use crate::scanner;

pub use identity::CatalogedBy;
pub use normalize::Normalized;
pub use writer::WriteSummary;

/// Why a single file could not be imported.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to parse {}: {source}", .path.display())]
    ParseFailure {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("No free track id after {attempts} attempts for \"{title}\"")]
    IdentityExhausted { title: String, attempts: usize },

    #[error("Failed to insert track \"{title}\": {source}")]
    WriteFailure {
        title: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database lookup failed: {0}")]
    Lookup(#[from] sqlx::Error),

    #[error("Timed out")]
    TimedOut,
}

impl ImportError {
    /// The title the file was being imported under, if it got that far.
    pub fn title(&self) -> Option<&str> {
        match self {
            ImportError::IdentityExhausted { title, .. } | ImportError::WriteFailure { title, .. } => {
                Some(title.as_str())
            }
            _ => None,
        }
    }
}

/// Successful result of importing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Imported {
        track_id: String,
        summary: WriteSummary,
    },
    AlreadyCataloged(CatalogedBy),
}

/// A file that failed to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub path: PathBuf,
    /// Title the import was attempted under
    pub title: Option<String>,
    pub error: String,
}

/// End-of-run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Audio files handed to the pipeline
    pub seen: usize,
    /// Files dropped by the extension filter
    pub excluded: usize,
    pub imported: usize,
    pub cataloged_by_path: usize,
    pub cataloged_by_title_artist: usize,
    /// Dependent rows (tags, lyrics, artists) that failed to write
    pub dependent_failures: usize,
    pub failures: Vec<FailureRecord>,
}

impl ImportReport {
    pub fn already_cataloged(&self) -> usize {
        self.cataloged_by_path + self.cataloged_by_title_artist
    }

    fn record(&mut self, path: &Path, result: Result<FileOutcome, ImportError>) {
        match result {
            Ok(FileOutcome::Imported { summary, .. }) => {
                self.imported += 1;
                self.dependent_failures += summary.dependent_failures;
            }
            Ok(FileOutcome::AlreadyCataloged(CatalogedBy::Path)) => self.cataloged_by_path += 1,
            Ok(FileOutcome::AlreadyCataloged(CatalogedBy::TitleArtist)) => {
                self.cataloged_by_title_artist += 1
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Import failed: {}", e);
                self.failures.push(FailureRecord {
                    path: path.to_path_buf(),
                    title: e.title().map(str::to_string),
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Source of candidate track ids.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Imports audio files into the catalog.
pub struct Importer {
    pool: SqlitePool,
    reader: Arc<dyn TagReader>,
    library: LibraryConfig,
    options: ImportConfig,
    generate_id: IdGenerator,
    admission: tokio::sync::Mutex<()>,
}

impl Importer {
    pub fn new(
        pool: SqlitePool,
        reader: Arc<dyn TagReader>,
        library: LibraryConfig,
        options: ImportConfig,
    ) -> Self {
        let id_length = options.id_length;
        Self {
            pool,
            reader,
            library,
            options,
            generate_id: Arc::new(move || identity::generate_id(id_length)),
            admission: tokio::sync::Mutex::new(()),
        }
    }

    /// Replace the random id source.
    pub fn with_id_generator(mut self, generate_id: IdGenerator) -> Self {
        self.generate_id = generate_id;
        self
    }

    /// Walk the library root and import every audio file under it.
    pub async fn import_directory(&self) -> Result<ImportReport, Error> {
        let root = self.library.root.clone();
        if !root.is_dir() {
            return Err(Error::root_not_found(root));
        }

        let extensions = self.library.extensions.clone();
        let walked = tokio::task::spawn_blocking(move || scanner::walk(&root, &extensions))
            .await
            .map_err(std::io::Error::other)
            .with_context("walking music root")?;

        let mut report = self.run(walked.audio).await;
        report.excluded = walked.excluded.len();
        Ok(report)
    }

    /// Import the given files. Never fails as a whole: per-file failures end
    /// up in [`ImportReport::failures`].
    pub async fn run(&self, paths: Vec<PathBuf>) -> ImportReport {
        let report = Mutex::new(ImportReport {
            seen: paths.len(),
            ..Default::default()
        });

        // The timeout is applied inside `import_file`, before the track insert
        let executor = BatchExecutor::new(self.options.chunk_size);
        {
            let report = &report;
            executor
                .run("import", paths, |path| async move {
                    let result = self.import_file(&path).await;
                    report.lock().record(&path, result);
                })
                .await;
        }

        let report = report.into_inner();

        tracing::info!(
            seen = report.seen,
            imported = report.imported,
            already_cataloged = report.already_cataloged(),
            failed = report.failures.len(),
            dependent_failures = report.dependent_failures,
            "Import finished"
        );
        report
    }

    /// Import a single file.
    pub async fn import_file(&self, path: &Path) -> Result<FileOutcome, ImportError> {
        let admission = match self.options.task_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.admit(path))
                .await
                .map_err(|_| ImportError::TimedOut)??,
            None => self.admit(path).await?,
        };

        let (normalized, title, admitted) = match admission {
            Admission::Cataloged(by) => return Ok(FileOutcome::AlreadyCataloged(by)),
            Admission::Admitted {
                normalized,
                title,
                lock,
            } => (normalized, title, lock),
        };

        writer::insert_track(&self.pool, &normalized.track)
            .await
            .map_err(|source| ImportError::WriteFailure { title, source })?;
        drop(admitted);

        let summary = writer::write_dependents(&self.pool, &normalized, &self.library).await;
        tracing::debug!(
            path = %normalized.track.file_path,
            id = %normalized.track.id,
            title = %normalized.track.title,
            "Track imported"
        );

        Ok(FileOutcome::Imported {
            track_id: normalized.track.id,
            summary,
        })
    }

    /// Everything up to the track insert. Writes nothing, so it can be
    /// dropped at any await point.
    async fn admit(&self, path: &Path) -> Result<Admission<'_>, ImportError> {
        let file_path = normalize::path_string(path);

        if identity::exists_by_path(&self.pool, &file_path).await? {
            tracing::debug!(path = %file_path, "Already cataloged by path");
            return Ok(Admission::Cataloged(CatalogedBy::Path));
        }

        let parsed = metadata::read_file(Arc::clone(&self.reader), path.to_path_buf())
            .await
            .map_err(|source| ImportError::ParseFailure {
                path: path.to_path_buf(),
                source,
            })?;

        let (title, artist) = normalize::title_artist(path, &parsed);
        let lock = self.admission.lock().await;

        if identity::exists_by_title_artist(&self.pool, &title, &artist).await? {
            tracing::debug!(path = %file_path, %title, %artist, "Already cataloged by title and artist");
            return Ok(Admission::Cataloged(CatalogedBy::TitleArtist));
        }

        let attempts = self.options.id_attempts;
        let Some(id) = identity::mint_id(&self.pool, attempts, || (self.generate_id)()).await? else {
            return Err(ImportError::IdentityExhausted { title, attempts });
        };

        Ok(Admission::Admitted {
            normalized: normalize::normalize(id, path, &parsed, &self.library),
            title,
            lock,
        })
    }
}

/// Result of the checks that precede a track insert.
enum Admission<'a> {
    Cataloged(CatalogedBy),
    /// Ready to insert; `lock` keeps other files from admitting the same
    /// (title, artist) until the insert is done
    Admitted {
        normalized: Normalized,
        title: String,
        lock: tokio::sync::MutexGuard<'a, ()>,
    },
}
