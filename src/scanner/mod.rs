use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files found under a music root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Walked {
    /// Audio files, sorted
    pub audio: Vec<PathBuf>,
    /// Files whose extension is not in the allow-list
    pub excluded: Vec<PathBuf>,
}

/// Recursively walks `root` and splits its files by extension.
///
/// Extensions are compared case-insensitively against `extensions`
/// (lowercase, without the dot). Unreadable entries are logged and skipped.
/// This is synchronous; call it from `spawn_blocking` in async code.
pub fn walk(root: &Path, extensions: &[String]) -> Walked {
    let mut walked = Walked::default();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        let allowed = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));

        if allowed {
            walked.audio.push(path);
        } else {
            tracing::debug!(path = %path.display(), "Excluded by extension");
            walked.excluded.push(path);
        }
    }

    walked.audio.sort();
    walked.excluded.sort();
    tracing::info!(
        root = %root.display(),
        audio = walked.audio.len(),
        excluded = walked.excluded.len(),
        "Scan complete"
    );
    walked
}
