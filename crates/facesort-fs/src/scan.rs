//! Photo discovery in an input folder.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File extensions treated as photos (compared case-insensitively).
pub const PHOTO_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("input folder not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("input path is not a folder: {}", .0.display())]
    NotADirectory(PathBuf),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Descend into subfolders instead of reading only the top level.
    pub recursive: bool,
}

/// Whether `path` has one of the [`PHOTO_EXTENSIONS`].
pub fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| PHOTO_EXTENSIONS.iter().any(|p| e.eq_ignore_ascii_case(p)))
        .unwrap_or(false)
}

/// List the photos in `dir`, sorted by path.
///
/// Entries that cannot be read during the walk are logged and skipped.
pub fn scan_photos(dir: &Path, options: ScanOptions) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.exists() {
        return Err(ScanError::NotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let mut photos = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(max_depth).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(
                    path = ?err.path(),
                    error = %err,
                    "skipping unreadable entry"
                );
                continue;
            }
        };
        if entry.file_type().is_file() && is_photo(entry.path()) {
            photos.push(entry.into_path());
        }
    }

    photos.sort();
    tracing::info!(
        folder = %dir.display(),
        photos = photos.len(),
        recursive = options.recursive,
        "scanned input folder"
    );
    Ok(photos)
}
