//! Health checks and the service description at `/`.

use super::schemas::{HealthResponse, ServiceInfo};
use super::{PersistentState, StatelessState};
use crate::error::{ThumbError, SUPPORTED_FORMATS};
use crate::output::utc_timestamp;
use axum::extract::State;
use axum::Json;

const SERVICE_NAME: &str = "On-Prem Document Thumbnail API";

/// `GET /health` on the persistent service.
///
/// Fails with 500 when the metadata index cannot be read.
pub async fn persistent_health(
    State(state): State<PersistentState>,
) -> Result<Json<HealthResponse>, ThumbError> {
    let total_files = state.service.record_count().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        time: utc_timestamp(),
        storage_dir: Some(state.config.storage_dir.display().to_string()),
        total_files: Some(total_files),
        soffice_cmd: state.service.thumbnailer().converter(),
        max_file_size: state.config.max_file_size,
        conversion_timeout_secs: state.config.conversion_timeout_secs,
    }))
}

/// `GET /health` on the stateless service.
pub async fn stateless_health(State(state): State<StatelessState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        time: utc_timestamp(),
        storage_dir: None,
        total_files: None,
        soffice_cmd: state.thumbnailer.converter(),
        max_file_size: state.config.max_file_size,
        conversion_timeout_secs: state.config.conversion_timeout_secs,
    })
}

/// `GET /` on the persistent service.
pub async fn persistent_root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        endpoints: [
            ("POST /upload", "Upload a document and generate thumbnail"),
            ("GET /check-duplicate/{filename}", "Check whether a filename is taken"),
            ("GET /files", "List uploaded files + thumbnails"),
            ("DELETE /delete/{doc_id}", "Delete a file and its thumbnail"),
            ("GET /thumbnails/{doc_id}.png", "Thumbnail image"),
            ("GET /documents/{doc_id}.ext", "Original file"),
            ("GET /health", "Health check"),
        ]
        .into_iter()
        .collect(),
        supported_formats: SUPPORTED_FORMATS,
    })
}

/// `GET /` on the stateless service.
pub async fn stateless_root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        endpoints: [
            ("POST /thumbnail", "Render the first page and return it as PNG"),
            ("POST /thumbnail-base64", "Render the first page and return base64 JSON"),
            ("GET /health", "Health check"),
        ]
        .into_iter()
        .collect(),
        supported_formats: SUPPORTED_FORMATS,
    })
}
