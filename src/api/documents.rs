//! Persistent document endpoints: upload, duplicate check, listing, delete.

use super::form::{self, UploadParams};
use super::PersistentState;
use crate::error::ThumbError;
use crate::output::{DeleteOutcome, DuplicateCheck, FileListing, UploadOutcome};
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;

/// `POST /upload` -- store a document and its first-page thumbnail.
///
/// `replace_existing` may come from the query string or from a form field;
/// the form field wins when both are present.
pub async fn upload(
    State(state): State<PersistentState>,
    Query(params): Query<UploadParams>,
    multipart: Multipart,
) -> Result<Json<UploadOutcome>, ThumbError> {
    let query_flag = params
        .replace_existing
        .as_deref()
        .map(form::parse_flag)
        .transpose()?;

    let upload = form::read_upload(
        multipart,
        state.service.max_file_size(),
        state.body_limit,
    )
    .await?;
    let replace_existing = upload.replace_existing.or(query_flag).unwrap_or(false);

    let outcome = state
        .service
        .handle_upload(upload.bytes, &upload.filename, replace_existing)
        .await?;
    Ok(Json(outcome))
}

/// `GET /check-duplicate/{filename}`
pub async fn check_duplicate(
    State(state): State<PersistentState>,
    Path(filename): Path<String>,
) -> Result<Json<DuplicateCheck>, ThumbError> {
    Ok(Json(state.service.check_duplicate(&filename).await?))
}

/// `GET /files`
pub async fn list_files(
    State(state): State<PersistentState>,
) -> Result<Json<FileListing>, ThumbError> {
    Ok(Json(state.service.list_files().await?))
}

/// `DELETE /delete/{doc_id}`
pub async fn delete(
    State(state): State<PersistentState>,
    Path(doc_id): Path<String>,
) -> Result<Json<DeleteOutcome>, ThumbError> {
    Ok(Json(state.service.delete(&doc_id).await?))
}
