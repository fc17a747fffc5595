//! Result types returned by [`crate::service::DocumentService`] and the
//! stateless thumbnail path.
//!
//! Every type here is `Serialize` with the JSON field names clients already
//! rely on, so the HTTP layer returns them as-is.

use crate::pipeline::encode;
use crate::storage;
use crate::store::DocumentRecord;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Current UTC time as RFC 3339 with microseconds and a `Z` suffix.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored `uploaded_at` into naive UTC.
///
/// Accepts RFC 3339 with any offset, and the offset-less
/// `YYYY-MM-DDTHH:MM:SS[.ffffff]` form older indexes hold (taken as UTC).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// A successful persistent upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    #[serde(rename = "doc_id")]
    pub id: String,
    pub original_filename: String,
    pub uploaded_at: String,
    #[serde(rename = "original_file_url")]
    pub original_url: String,
    pub thumbnail_url: String,
    /// A same-name document existed and was replaced.
    #[serde(rename = "duplicate_replaced")]
    pub replaced: bool,
}

/// Answer to "is this filename taken?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateCheck {
    pub exists: bool,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_uploaded_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DuplicateCheck {
    pub fn taken(filename: &str, id: &str, record: &DocumentRecord) -> Self {
        Self {
            exists: true,
            filename: filename.to_string(),
            existing_doc_id: Some(id.to_string()),
            existing_uploaded_at: Some(record.uploaded_at.clone()),
            existing_file_url: Some(storage::original_url(id, &record.extension)),
            existing_thumbnail_url: Some(storage::thumbnail_url(id)),
            message: None,
        }
    }

    pub fn available(filename: &str) -> Self {
        Self {
            exists: false,
            filename: filename.to_string(),
            existing_doc_id: None,
            existing_uploaded_at: None,
            existing_file_url: None,
            existing_thumbnail_url: None,
            message: Some("Filename is available for upload".to_string()),
        }
    }
}

/// One row of `/files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub doc_id: String,
    pub filename: String,
    pub uploaded_at: String,
    pub thumbnail_url: String,
    pub file_url: String,
}

impl FileEntry {
    pub fn new(id: &str, record: &DocumentRecord) -> Self {
        Self {
            doc_id: id.to_string(),
            filename: record.original_filename.clone(),
            uploaded_at: record.uploaded_at.clone(),
            thumbnail_url: storage::thumbnail_url(id),
            file_url: storage::original_url(id, &record.extension),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileListing {
    pub files: Vec<FileEntry>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub doc_id: String,
    pub deleted: bool,
    /// Filesystem paths that were removed.
    pub removed_files: Vec<String>,
}

/// JSON form of a stateless thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThumbnailEnvelope {
    pub filename: String,
    pub mime: &'static str,
    pub size_bytes: usize,
    /// Hex SHA-256 of the PNG bytes.
    pub sha256: String,
    pub generated_at: String,
    pub png_base64: String,
}

impl ThumbnailEnvelope {
    pub fn new(filename: &str, png: &[u8]) -> Self {
        Self {
            filename: filename.to_string(),
            mime: encode::PNG_MIME,
            size_bytes: png.len(),
            sha256: encode::sha256_hex(png),
            generated_at: utc_timestamp(),
            png_base64: encode::to_base64(png),
        }
    }
}
