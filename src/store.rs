//! The metadata index: doc_id → [`DocumentRecord`].
//!
//! [`MetadataStore`] is the seam; [`JsonFileStore`] is the production
//! backing (one pretty-printed JSON object, loaded and rewritten whole on
//! every mutation) and [`MemoryStore`] is the test double.
//!
//! There is no cross-request locking. Two uploads of the same filename can
//! both pass the duplicate check before either records itself; both records
//! then survive.

use crate::error::ThumbError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

/// One stored document. Serialised with the field names of the existing
/// `metadata.json` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(rename = "filename")]
    pub original_filename: String,
    /// Leading dot included; empty when the upload had no extension.
    pub extension: String,
    /// RFC 3339 UTC, e.g. `2025-10-27T10:15:23.123456Z`.
    pub uploaded_at: String,
}

/// The full index.
pub type Metadata = BTreeMap<String, DocumentRecord>;

/// Storage for the metadata index.
///
/// Implementors supply [`load`](Self::load) and [`save`](Self::save); the
/// helpers are load → mutate → save over the whole mapping.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// The whole index; empty when nothing was ever saved.
    async fn load(&self) -> Result<Metadata, ThumbError>;

    /// Replace the whole index.
    async fn save(&self, metadata: &Metadata) -> Result<(), ThumbError>;

    /// Insert or overwrite `id`.
    async fn add(&self, id: &str, record: DocumentRecord) -> Result<(), ThumbError> {
        let mut metadata = self.load().await?;
        metadata.insert(id.to_string(), record);
        self.save(&metadata).await
    }

    /// Drop `id`. Returns whether it was present; saves only if it was.
    async fn remove(&self, id: &str) -> Result<bool, ThumbError> {
        let mut metadata = self.load().await?;
        if metadata.remove(id).is_none() {
            return Ok(false);
        }
        self.save(&metadata).await?;
        Ok(true)
    }

    /// First record whose original filename equals `name`. O(n).
    async fn find_by_filename(
        &self,
        name: &str,
    ) -> Result<Option<(String, DocumentRecord)>, ThumbError> {
        let metadata = self.load().await?;
        Ok(metadata
            .into_iter()
            .find(|(_, record)| record.original_filename == name))
    }
}

// ── JSON file ────────────────────────────────────────────────────────────

/// Index persisted as one JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load_unlocked(&self) -> Result<Metadata, ThumbError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Metadata::new()),
            Err(e) => return Err(ThumbError::storage(&self.path, e)),
        };
        serde_json::from_slice(&raw).map_err(|e| {
            ThumbError::Metadata(format!("{} is not valid: {}", self.path.display(), e))
        })
    }

    /// Full overwrite via a sibling temp file + rename, so a reader never
    /// sees a half-written index.
    async fn save_unlocked(&self, metadata: &Metadata) -> Result<(), ThumbError> {
        let json = serde_json::to_vec_pretty(metadata)
            .map_err(|e| ThumbError::Metadata(format!("serialisation failed: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ThumbError::storage(parent, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| ThumbError::storage(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ThumbError::storage(&self.path, e))?;

        debug!(path = %self.path.display(), records = metadata.len(), "Saved metadata");
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for JsonFileStore {
    async fn load(&self) -> Result<Metadata, ThumbError> {
        self.load_unlocked().await
    }

    async fn save(&self, metadata: &Metadata) -> Result<(), ThumbError> {
        let _guard = self.write_lock.lock().await;
        self.save_unlocked(metadata).await
    }

    async fn add(&self, id: &str, record: DocumentRecord) -> Result<(), ThumbError> {
        let _guard = self.write_lock.lock().await;
        let mut metadata = self.load_unlocked().await?;
        metadata.insert(id.to_string(), record);
        self.save_unlocked(&metadata).await
    }

    async fn remove(&self, id: &str) -> Result<bool, ThumbError> {
        let _guard = self.write_lock.lock().await;
        let mut metadata = self.load_unlocked().await?;
        if metadata.remove(id).is_none() {
            return Ok(false);
        }
        self.save_unlocked(&metadata).await?;
        Ok(true)
    }
}

// ── In memory ────────────────────────────────────────────────────────────

/// Index kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Metadata>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn load(&self) -> Result<Metadata, ThumbError> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save(&self, metadata: &Metadata) -> Result<(), ThumbError> {
        *self.inner.lock().await = metadata.clone();
        Ok(())
    }
}
