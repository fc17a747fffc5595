//! JSON error bodies.
//!
//! Every error is `{"error": "<message>"}` with the status from
//! [`ThumbError::status`]. Duplicate and unsupported-format errors carry the
//! extra fields clients use to offer a retry.

use crate::error::{ThumbError, SUPPORTED_FORMATS};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

impl IntoResponse for ThumbError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", self);
        } else {
            warn!(status = status.as_u16(), "{}", self);
        }

        let body = match &self {
            ThumbError::DuplicateFilename {
                filename,
                existing_id,
                existing_uploaded_at,
            } => json!({
                "error": "File with this name already exists",
                "filename": filename,
                "existing_doc_id": existing_id,
                "existing_uploaded_at": existing_uploaded_at,
                "message": "Use replace_existing=true to replace the existing file",
            }),
            ThumbError::UnsupportedFormat { filename } => json!({
                "error": "Unsupported file type",
                "filename": filename,
                "supported_formats": SUPPORTED_FORMATS,
                "message": "Please upload a PDF or Office document.",
            }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
