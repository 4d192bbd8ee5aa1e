//! Request handlers.

use super::error::ApiError;
use super::AppState;
use crate::convert;
use crate::output::{ConversionResult, FileConversionOutput};
use crate::redact::redact_value;
use crate::request::TranscribeImageInput;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::debug;

/// `POST /api/transcribe-image`
pub async fn transcribe_image(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ConversionResult>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    debug!(body = %redact_value(&body), "transcribe-image body");

    let input: TranscribeImageInput = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))?;

    let result = convert::transcribe_image(state.gateway.as_ref(), &state.config, input)
        .await
        .map_err(ApiError::transcription)?;
    Ok(Json(result))
}

/// `POST /api/convert-file`
///
/// Takes the first multipart field that carries a file name.
pub async fn convert_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FileConversionOutput>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let upload = loop {
        let Some(field) = multipart.next_field().await.map_err(multipart_error)? else {
            break None;
        };
        if let Some(filename) = field.file_name().map(str::to_string) {
            let bytes = field.bytes().await.map_err(multipart_error)?;
            break Some((filename, bytes));
        }
    };

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let output = convert::convert_upload(&bytes, &filename, &state.extractors, &state.config)
        .await
        .map_err(ApiError::conversion)?;
    Ok(Json(output))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(e.body_text())
    }
}
