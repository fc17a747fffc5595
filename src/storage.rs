//! On-disk blob layout: originals under `documents/`, thumbnails under
//! `thumbnails/`, both keyed by doc_id.
//!
//! Removal here is best-effort by contract. [`best_effort_remove`] logs and
//! reports failures through its return value; nothing in this module raises
//! on a failed delete.

use crate::error::ThumbError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Remove `path` if it is a file. Returns `true` only if a file was removed.
///
/// Missing files are not errors; other failures are logged and swallowed.
pub fn best_effort_remove(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), "Failed to remove: {}", e);
            false
        }
    }
}

/// Extension of the final path component of `filename`, with its dot.
///
/// Empty when there is no dot, or when the only dot leads the name
/// (`.bashrc`).
pub fn extension_of(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem_start = base.len() - base.trim_start_matches('.').len();
    match base[stem_start..].rfind('.') {
        Some(i) => base[stem_start + i..].to_string(),
        None => String::new(),
    }
}

/// A doc_id is safe when it cannot name anything outside the blob dirs.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\']) && !id.contains("..")
}

/// Public URL of an original blob.
pub fn original_url(id: &str, extension: &str) -> String {
    format!("/documents/{id}{extension}")
}

/// Public URL of a thumbnail blob.
pub fn thumbnail_url(id: &str) -> String {
    format!("/thumbnails/{id}.png")
}

/// The two blob directories.
#[derive(Debug, Clone)]
pub struct BlobStore {
    documents_dir: PathBuf,
    thumbnails_dir: PathBuf,
}

impl BlobStore {
    pub fn new(documents_dir: impl Into<PathBuf>, thumbnails_dir: impl Into<PathBuf>) -> Self {
        Self {
            documents_dir: documents_dir.into(),
            thumbnails_dir: thumbnails_dir.into(),
        }
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    pub fn thumbnails_dir(&self) -> &Path {
        &self.thumbnails_dir
    }

    /// Create both directories if missing.
    pub async fn ensure_dirs(&self) -> Result<(), ThumbError> {
        for dir in [&self.documents_dir, &self.thumbnails_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| ThumbError::storage(dir, e))?;
        }
        Ok(())
    }

    pub fn original_path(&self, id: &str, extension: &str) -> PathBuf {
        self.documents_dir.join(format!("{id}{extension}"))
    }

    pub fn thumbnail_path(&self, id: &str) -> PathBuf {
        self.thumbnails_dir.join(format!("{id}.png"))
    }

    pub async fn write_original(
        &self,
        id: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, ThumbError> {
        let path = self.original_path(id, extension);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ThumbError::storage(&path, e))?;
        info!(path = %path.display(), "Saved original file");
        Ok(path)
    }

    pub async fn write_thumbnail(&self, id: &str, png: &[u8]) -> Result<PathBuf, ThumbError> {
        let path = self.thumbnail_path(id);
        tokio::fs::write(&path, png)
            .await
            .map_err(|e| ThumbError::storage(&path, e))?;
        info!(path = %path.display(), "Saved thumbnail");
        Ok(path)
    }

    /// Best-effort removal of a known original + thumbnail pair.
    pub fn remove_pair(&self, id: &str, extension: &str) {
        best_effort_remove(&self.original_path(id, extension));
        best_effort_remove(&self.thumbnail_path(id));
    }

    /// Remove every blob belonging to `id`: originals named `id` or
    /// `id.<ext>`, then `{id}.png`. Returns the paths actually removed.
    pub fn remove_all(&self, id: &str) -> Vec<PathBuf> {
        let mut removed = Vec::new();
        if !is_safe_id(id) {
            return removed;
        }

        match std::fs::read_dir(&self.documents_dir) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let name = entry.file_name();
                    let name = name.to_string_lossy();
                    let Some(rest) = name.strip_prefix(id) else {
                        continue;
                    };
                    if !(rest.is_empty() || rest.starts_with('.')) {
                        continue;
                    }
                    let path = entry.path();
                    if path.is_file() && best_effort_remove(&path) {
                        info!(path = %path.display(), "Deleted");
                        removed.push(path);
                    }
                }
            }
            Err(e) => warn!(
                dir = %self.documents_dir.display(),
                "Cannot scan documents directory: {}", e
            ),
        }

        let thumb = self.thumbnail_path(id);
        if thumb.is_file() && best_effort_remove(&thumb) {
            info!(path = %thumb.display(), "Deleted");
            removed.push(thumb);
        }
        removed
    }
}
