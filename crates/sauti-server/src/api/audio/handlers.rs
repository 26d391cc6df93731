//! Handlers for audio persisted under a display filename.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tokio_util::io::ReaderStream;

use sauti_core::format::content_type_for_filename;
use sauti_core::transcode::format_duration;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /audio/{filename}` — stream a saved file, content type by
/// extension. Unsafe names look exactly like missing ones.
pub async fn get_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (file, len) = state
        .audio_store
        .open(&filename)
        .await
        .map_err(|err| ApiError::internal("Storage error", err.to_string()))?
        .ok_or_else(|| not_found(&filename))?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, content_type_for_filename(&filename))
        .header(header::CONTENT_LENGTH, len)
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", filename.replace('"', "")),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .unwrap_or_else(|_| Response::new(Body::empty()));

    Ok(response)
}

#[derive(Debug, Serialize)]
pub struct DurationResponse {
    pub success: bool,
    pub filename: String,
    pub duration_seconds: f64,
    pub duration_formatted: String,
}

/// `GET /api/duration/{filename}` — probe a saved file's duration.
///
/// Unlike the synthesis pipeline (where duration is incidental
/// metadata), the probe is the whole request here, so tool failures
/// surface as 500s instead of degrading to the fallback.
pub async fn get_duration(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DurationResponse>, ApiError> {
    let path = state
        .audio_store
        .lookup(&filename)
        .await
        .ok_or_else(|| not_found(&filename))?;

    let duration_seconds = state.transcoder.try_probe_duration(&path).await?;

    Ok(Json(DurationResponse {
        success: true,
        filename,
        duration_seconds,
        duration_formatted: format_duration(duration_seconds),
    }))
}

fn not_found(filename: &str) -> ApiError {
    ApiError::not_found("File not found", format!("No saved audio named '{filename}'."))
}
