//! Persistent document bookkeeping: upload, replace, list, delete.
//!
//! [`DocumentService`] ties the three stores together. The metadata index
//! and the blob directories are never updated atomically with each other;
//! the upload path instead rolls back the original it wrote when anything
//! after that write fails, and every cleanup is best-effort.

use crate::config::ServiceConfig;
use crate::error::ThumbError;
use crate::output::{
    parse_timestamp, utc_timestamp, DeleteOutcome, DuplicateCheck, FileEntry, FileListing,
    UploadOutcome,
};
use crate::pipeline::route::{ThumbnailPipeline, Thumbnailer};
use crate::storage::{self, BlobStore};
use crate::store::{DocumentRecord, JsonFileStore, MetadataStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Upload handler plus the query and delete operations around it.
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn MetadataStore>,
    thumbnailer: Arc<dyn Thumbnailer>,
    blobs: BlobStore,
    max_file_size: usize,
}

impl std::fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService")
            .field("blobs", &self.blobs)
            .field("max_file_size", &self.max_file_size)
            .finish_non_exhaustive()
    }
}

impl DocumentService {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        thumbnailer: Arc<dyn Thumbnailer>,
        blobs: BlobStore,
        max_file_size: usize,
    ) -> Self {
        Self {
            store,
            thumbnailer,
            blobs,
            max_file_size,
        }
    }

    /// JSON-file metadata and the pdfium/LibreOffice pipeline, laid out
    /// under `config.storage_dir`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            Arc::new(JsonFileStore::new(config.metadata_file())),
            Arc::new(ThumbnailPipeline::from_config(config)),
            BlobStore::new(config.documents_dir(), config.thumbnails_dir()),
            config.max_file_size,
        )
    }

    /// Create the blob directories. Call once before serving.
    pub async fn prepare(&self) -> Result<(), ThumbError> {
        self.blobs.ensure_dirs().await
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn thumbnailer(&self) -> &Arc<dyn Thumbnailer> {
        &self.thumbnailer
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Store an upload, generate its thumbnail and record it.
    ///
    /// The duplicate check runs before the size check, so an oversized file
    /// whose name is taken is reported as a duplicate. Once those checks
    /// pass, the upload is either committed or rolled back even if the
    /// returned future is dropped.
    ///
    /// # Errors
    /// - [`ThumbError::EmptyUpload`] for a zero-byte body
    /// - [`ThumbError::DuplicateFilename`] when the name is taken and
    ///   `replace_existing` is false
    /// - [`ThumbError::TooLarge`] above the configured maximum
    /// - any routing or conversion error, after the original is rolled back
    pub async fn handle_upload(
        &self,
        file_bytes: Vec<u8>,
        filename: &str,
        replace_existing: bool,
    ) -> Result<UploadOutcome, ThumbError> {
        info!(filename, size = file_bytes.len(), "Upload started");

        // ── Step 1: Reject empty bodies ──────────────────────────────────────
        if file_bytes.is_empty() {
            return Err(ThumbError::EmptyUpload);
        }

        // ── Step 2: Duplicate check ──────────────────────────────────────────
        let existing = self.store.find_by_filename(filename).await?;
        if let Some((existing_id, record)) = &existing {
            if !replace_existing {
                info!(filename, existing_id = %existing_id, "Duplicate filename rejected");
                return Err(ThumbError::DuplicateFilename {
                    filename: filename.to_string(),
                    existing_id: existing_id.clone(),
                    existing_uploaded_at: record.uploaded_at.clone(),
                });
            }
        }

        // ── Step 3: Size limit ───────────────────────────────────────────────
        if file_bytes.len() > self.max_file_size {
            return Err(ThumbError::TooLarge {
                size: file_bytes.len(),
                max: self.max_file_size,
            });
        }

        // Steps 4-7 run to completion on their own task, even if the caller
        // drops this future mid-conversion.
        let service = self.clone();
        let filename = filename.to_string();
        tokio::spawn(async move { service.commit_upload(file_bytes, &filename, existing).await })
            .await
            .map_err(|e| ThumbError::Internal(format!("Upload task panicked: {}", e)))?
    }

    async fn commit_upload(
        &self,
        file_bytes: Vec<u8>,
        filename: &str,
        existing: Option<(String, DocumentRecord)>,
    ) -> Result<UploadOutcome, ThumbError> {
        // ── Step 4: Replace the prior document ───────────────────────────────
        let mut replaced = false;
        if let Some((existing_id, record)) = existing {
            self.remove_blobs(existing_id.clone(), Some(record.extension))
                .await?;
            self.store.remove(&existing_id).await?;
            replaced = true;
            info!(filename, replaced_id = %existing_id, "Replaced existing file");
        }

        // ── Step 5: Assign id and store the original ─────────────────────────
        let id = Uuid::new_v4().simple().to_string();
        let extension = storage::extension_of(filename);
        self.blobs
            .write_original(&id, &extension, &file_bytes)
            .await?;

        // ── Step 6: Thumbnail (rolls the original back on failure) ───────────
        let png = match self.thumbnailer.thumbnail(file_bytes, filename).await {
            Ok(png) => png,
            Err(e) => {
                warn!(filename, doc_id = %id, "Thumbnail generation failed: {}", e);
                self.rollback(&id, &extension).await;
                return Err(e);
            }
        };
        if let Err(e) = self.blobs.write_thumbnail(&id, &png).await {
            self.rollback(&id, &extension).await;
            return Err(e);
        }

        // ── Step 7: Record metadata ──────────────────────────────────────────
        let uploaded_at = utc_timestamp();
        self.store
            .add(
                &id,
                DocumentRecord {
                    original_filename: filename.to_string(),
                    extension: extension.clone(),
                    uploaded_at: uploaded_at.clone(),
                },
            )
            .await?;

        info!(doc_id = %id, "Upload completed");
        Ok(UploadOutcome {
            original_url: storage::original_url(&id, &extension),
            thumbnail_url: storage::thumbnail_url(&id),
            id,
            original_filename: filename.to_string(),
            uploaded_at,
            replaced,
        })
    }

    /// Whether `filename` is already recorded, and where it lives if so.
    pub async fn check_duplicate(&self, filename: &str) -> Result<DuplicateCheck, ThumbError> {
        Ok(match self.store.find_by_filename(filename).await? {
            Some((id, record)) => DuplicateCheck::taken(filename, &id, &record),
            None => DuplicateCheck::available(filename),
        })
    }

    /// Every recorded document, oldest upload first.
    pub async fn list_files(&self) -> Result<FileListing, ThumbError> {
        let metadata = self.store.load().await?;
        let mut files: Vec<FileEntry> = metadata
            .iter()
            .map(|(id, record)| FileEntry::new(id, record))
            .collect();
        // Stamps that do not parse sort last, in string order.
        files.sort_by_cached_key(|f| {
            let at = parse_timestamp(&f.uploaded_at);
            (at.is_none(), at, f.uploaded_at.clone())
        });
        Ok(FileListing {
            total: files.len(),
            files,
        })
    }

    pub async fn record_count(&self) -> Result<usize, ThumbError> {
        Ok(self.store.load().await?.len())
    }

    /// Remove every blob of `id` and its record.
    ///
    /// # Errors
    /// [`ThumbError::NotFound`] when nothing was removed, including for ids
    /// that could name a path outside the blob directories.
    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, ThumbError> {
        info!(doc_id = id, "Delete requested");
        if !storage::is_safe_id(id) {
            return Err(ThumbError::NotFound { id: id.to_string() });
        }

        let removed = self.remove_blobs(id.to_string(), None).await?;
        if removed.is_empty() {
            return Err(ThumbError::NotFound { id: id.to_string() });
        }

        self.store.remove(id).await?;
        info!(doc_id = id, files = removed.len(), "Delete completed");
        Ok(DeleteOutcome {
            doc_id: id.to_string(),
            deleted: true,
            removed_files: removed
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        })
    }

    /// Blob removal on the blocking pool. With an extension only that exact
    /// pair is targeted; without one every `id` / `id.<ext>` original is.
    async fn remove_blobs(
        &self,
        id: String,
        extension: Option<String>,
    ) -> Result<Vec<PathBuf>, ThumbError> {
        let blobs = self.blobs.clone();
        tokio::task::spawn_blocking(move || match extension {
            Some(ext) => {
                blobs.remove_pair(&id, &ext);
                Vec::new()
            }
            None => blobs.remove_all(&id),
        })
        .await
        .map_err(|e| ThumbError::Internal(format!("Blob removal task panicked: {}", e)))
    }

    async fn rollback(&self, id: &str, extension: &str) {
        debug!(doc_id = id, "Rolling back stored original");
        if let Err(e) = self
            .remove_blobs(id.to_string(), Some(extension.to_string()))
            .await
        {
            warn!(doc_id = id, "Rollback failed: {}", e);
        }
    }
}
