//! Stateless endpoints: render and return, store nothing.

use super::form;
use super::StatelessState;
use crate::error::ThumbError;
use crate::output::ThumbnailEnvelope;
use crate::pipeline::encode::PNG_MIME;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

/// Shared by both routes: empty and oversized bodies are rejected before
/// any conversion starts.
async fn render_upload(
    state: &StatelessState,
    multipart: Multipart,
) -> Result<(String, Vec<u8>), ThumbError> {
    let max_file_size = state.config.max_file_size;
    let upload = form::read_upload(multipart, max_file_size, state.body_limit).await?;
    if upload.bytes.is_empty() {
        return Err(ThumbError::EmptyUpload);
    }
    if upload.bytes.len() > max_file_size {
        return Err(ThumbError::TooLarge {
            size: upload.bytes.len(),
            max: max_file_size,
        });
    }

    info!(filename = %upload.filename, size = upload.bytes.len(), "Stateless thumbnail requested");
    let png = state
        .thumbnailer
        .thumbnail(upload.bytes, &upload.filename)
        .await?;
    Ok((upload.filename, png))
}

/// `POST /thumbnail` -- raw `image/png` body.
pub async fn thumbnail(
    State(state): State<StatelessState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ThumbError> {
    let (_, png) = render_upload(&state, multipart).await?;
    Ok(([(header::CONTENT_TYPE, PNG_MIME)], png))
}

/// `POST /thumbnail-base64` -- JSON envelope with the PNG inlined.
pub async fn thumbnail_base64(
    State(state): State<StatelessState>,
    multipart: Multipart,
) -> Result<Json<ThumbnailEnvelope>, ThumbError> {
    let (filename, png) = render_upload(&state, multipart).await?;
    Ok(Json(ThumbnailEnvelope::new(&filename, &png)))
}
