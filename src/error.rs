//! Error types for the docthumb library.
//!
//! Every failure an upload or a conversion can hit is one variant of
//! [`ThumbError`], so HTTP handlers and the CLI can match on outcomes
//! instead of parsing strings. [`ThumbError::status`] gives the HTTP status
//! each variant maps to; the JSON body is rendered in [`crate::api::error`].
//!
//! Best-effort cleanup (temp files, replaced blobs, rollback deletes) never
//! produces a `ThumbError`; those failures are logged and swallowed. See
//! [`crate::storage::best_effort_remove`].

use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Display names of every accepted upload format, as reported to clients.
pub const SUPPORTED_FORMATS: [&str; 5] = ["PDF", "DOC", "DOCX", "PPT", "PPTX"];

/// All errors returned by the docthumb library.
#[derive(Debug, Error)]
pub enum ThumbError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// The uploaded body was zero bytes long.
    #[error("Empty file upload.")]
    EmptyUpload,

    /// A record with the same original filename already exists and the
    /// caller did not ask to replace it.
    #[error("File with this name already exists: '{filename}' (doc_id {existing_id})")]
    DuplicateFilename {
        filename: String,
        existing_id: String,
        existing_uploaded_at: String,
    },

    /// Upload exceeded the configured maximum size.
    #[error("File too large. Max {}MB.", .max / (1024 * 1024))]
    TooLarge { size: usize, max: usize },

    /// The request body passed `limit` bytes before the upload was fully
    /// read, so its real size is unknown.
    #[error("File too large. Max {}MB.", .max / (1024 * 1024))]
    BodyTooLarge { limit: usize, max: usize },

    /// The request itself was malformed (missing multipart field etc.).
    #[error("{0}")]
    BadRequest(String),

    // ── Routing / document errors ─────────────────────────────────────────
    /// The filename does not end in a supported extension.
    #[error("Unsupported file type: '{filename}'")]
    UnsupportedFormat { filename: String },

    /// The bytes could not be opened as a PDF.
    #[error("File is not a valid PDF or cannot be opened as PDF: {detail}")]
    InvalidDocument { detail: String },

    /// The PDF opened fine but has no pages to render.
    #[error("PDF has 0 pages.")]
    EmptyDocument,

    /// pdfium accepted the document but failed to rasterise page one.
    #[error("Rasterisation failed: {detail}")]
    RasterisationFailed { detail: String },

    // ── Office conversion errors ──────────────────────────────────────────
    /// The external converter did not finish within the configured timeout.
    #[error("LibreOffice/soffice conversion timed out after {secs}s.")]
    ConversionTimeout { secs: u64 },

    /// The external converter could not be started or exited non-zero.
    #[error("LibreOffice/soffice failed to convert file to PDF (exit {}). stderr={stderr}",
        .code.map_or_else(|| "n/a".to_string(), |c| c.to_string()))]
    ConversionFailed { code: Option<i32>, stderr: String },

    /// The external converter exited cleanly but wrote no PDF.
    #[error("LibreOffice/soffice conversion succeeded but no PDF was found. stderr={stderr}")]
    ConversionProducedNoOutput { stderr: String },

    // ── Storage errors ────────────────────────────────────────────────────
    /// Nothing is stored under the requested id.
    #[error("No files found for doc_id '{id}'.")]
    NotFound { id: String },

    /// Reading or writing a blob failed.
    #[error("Storage I/O failed for '{path}': {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The metadata index could not be read, parsed or written.
    #[error("Metadata index error: {0}")]
    Metadata(String),

    // ── Engine errors ─────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    EngineUnavailable(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ThumbError {
    /// HTTP status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ThumbError::EmptyUpload
            | ThumbError::BadRequest(_)
            | ThumbError::UnsupportedFormat { .. }
            | ThumbError::InvalidDocument { .. }
            | ThumbError::EmptyDocument => StatusCode::BAD_REQUEST,
            ThumbError::DuplicateFilename { .. } => StatusCode::CONFLICT,
            ThumbError::TooLarge { .. } | ThumbError::BodyTooLarge { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ThumbError::NotFound { .. } => StatusCode::NOT_FOUND,
            ThumbError::RasterisationFailed { .. }
            | ThumbError::ConversionTimeout { .. }
            | ThumbError::ConversionFailed { .. }
            | ThumbError::ConversionProducedNoOutput { .. }
            | ThumbError::Storage { .. }
            | ThumbError::Metadata(_)
            | ThumbError::EngineUnavailable(_)
            | ThumbError::InvalidConfig(_)
            | ThumbError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wrap an I/O error with the path it happened on.
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ThumbError::Storage {
            path: path.into(),
            source,
        }
    }
}
