//! Multipart upload parsing shared by the persistent and stateless routes.

use crate::error::ThumbError;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use serde::Deserialize;

/// The parts of an upload request the handlers use.
#[derive(Debug)]
pub struct UploadForm {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Set when the form carried a `replace_existing` field.
    pub replace_existing: Option<bool>,
}

/// Query string of `POST /upload`.
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    pub replace_existing: Option<String>,
}

/// Read the `file` part (and an optional `replace_existing` part).
///
/// A body that trips the request size limit is reported as
/// [`ThumbError::BodyTooLarge`] carrying `body_limit`.
pub async fn read_upload(
    mut multipart: Multipart,
    max_file_size: usize,
    body_limit: usize,
) -> Result<UploadForm, ThumbError> {
    let read_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ThumbError::BodyTooLarge {
                limit: body_limit,
                max: max_file_size,
            }
        } else {
            ThumbError::BadRequest(format!("Multipart error: {}", e))
        }
    };

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut replace_existing = None;

    while let Some(field) = multipart.next_field().await.map_err(read_error)? {
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(|n| n.to_string())
                    .ok_or_else(|| {
                        ThumbError::BadRequest("The 'file' part has no filename.".to_string())
                    })?;
                let bytes = field.bytes().await.map_err(read_error)?.to_vec();
                file = Some((filename, bytes));
            }
            Some("replace_existing") => {
                let value = field.text().await.map_err(read_error)?;
                replace_existing = Some(parse_flag(&value)?);
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| ThumbError::BadRequest("Missing multipart field 'file'.".to_string()))?;
    Ok(UploadForm {
        filename,
        bytes,
        replace_existing,
    })
}

/// Lenient boolean: `true/false`, `1/0`, `yes/no`, `on/off`, any case.
pub fn parse_flag(value: &str) -> Result<bool, ThumbError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ThumbError::BadRequest(format!(
            "replace_existing must be a boolean, got '{}'",
            other
        ))),
    }
}
