//! The synthesis pipeline and its response emitters.
//!
//! One request flows Validate → Synthesize → (Transcode) → Probe → Emit,
//! with every intermediate file tracked by an `ArtifactSet`. The guard's
//! drop semantics cover the failure exits; the deliberate exits release
//! explicitly once the bytes are safely out of the files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use axum::body::Body;
use axum::extract::{Extension, Json, State};
use axum::http::header;
use axum::response::Response;
use base64::Engine;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::info;

use sauti_core::transcode::format_duration;
use sauti_core::{language, ArtifactSet, AudioFormat, Language, MAX_TEXT_CHARS};

use crate::api::request_context::RequestContext;
use crate::error::ApiError;
use crate::state::AppState;

const FILENAME_PREFIX: &str = "speech";

#[derive(Debug, Clone, Deserialize)]
pub struct TtsRequestBody {
    #[serde(default, alias = "input")]
    pub text: Option<String>,
    #[serde(default, alias = "language")]
    pub lang: Option<String>,
    #[serde(default, alias = "format")]
    pub file: Option<String>,
}

/// A request that passed validation. Immutable from here on.
#[derive(Debug, Clone)]
struct ValidatedRequest {
    text: String,
    language: &'static Language,
    format: AudioFormat,
}

/// Pure validation of the request body, applied in rule order.
fn validate(body: &TtsRequestBody) -> Result<ValidatedRequest, ApiError> {
    let text = body.text.as_deref().unwrap_or("");
    if text.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Invalid text",
            "Request must include a non-empty `text` field.",
        ));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(ApiError::bad_request(
            "Text too long",
            format!("Text exceeds the {MAX_TEXT_CHARS}-character limit."),
        ));
    }

    let alias = body
        .lang
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .unwrap_or(language::DEFAULT_ALIAS)
        .to_ascii_lowercase();
    let language = language::resolve(&alias).ok_or_else(|| {
        ApiError::bad_request(
            "Unsupported language",
            format!("Language '{alias}' is not supported. See /api/tts/languages."),
        )
    })?;

    let format_raw = body
        .file
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .unwrap_or("mp3");
    let format = AudioFormat::parse(format_raw).ok_or_else(|| {
        ApiError::bad_request(
            "Unsupported format",
            format!("Format '{format_raw}' is not supported; use mp3 or wav."),
        )
    })?;

    Ok(ValidatedRequest {
        text: text.to_string(),
        language,
        format,
    })
}

/// Everything downstream emitters need about a finished artifact.
struct PipelineOutput {
    artifacts: ArtifactSet,
    audio_path: PathBuf,
    filename: String,
    file_index: u64,
    duration_secs: f64,
    size_bytes: u64,
    format: AudioFormat,
    language: &'static Language,
    text_chars: usize,
}

/// Synthesize (and transcode when needed), then probe duration. Any `?`
/// exit drops `artifacts`, which schedules cleanup of whatever stage
/// already wrote to disk.
async fn run_pipeline(
    state: &AppState,
    ctx: &RequestContext,
    req: &ValidatedRequest,
) -> Result<PipelineOutput, ApiError> {
    let mut artifacts = ArtifactSet::new();

    let synth_path = state.temp_path(AudioFormat::Mp3.extension());
    artifacts.track(&synth_path);
    state
        .engine
        .synthesize(&req.text, req.language.code, &synth_path)
        .await?;

    let audio_path = match req.format {
        AudioFormat::Mp3 => synth_path,
        AudioFormat::Wav => {
            let wav_path = state.temp_path(AudioFormat::Wav.extension());
            artifacts.track(&wav_path);
            state
                .transcoder
                .transcode_to_wav(&synth_path, &wav_path)
                .await?;
            wav_path
        }
    };

    let duration_secs = state.transcoder.probe_duration(&audio_path).await;
    let size_bytes = tokio::fs::metadata(&audio_path)
        .await
        .map_err(|err| ApiError::internal("Storage error", err.to_string()))?
        .len();

    let file_index = state.next_file_index();
    let filename = format!("{FILENAME_PREFIX}_{file_index}.{}", req.format.extension());

    info!(
        correlation_id = %ctx.correlation_id,
        filename,
        language = req.language.code,
        format = %req.format,
        size_bytes,
        duration_secs,
        "synthesis complete"
    );

    Ok(PipelineOutput {
        artifacts,
        audio_path,
        filename,
        file_index,
        duration_secs,
        size_bytes,
        format: req.format,
        language: req.language,
        text_chars: req.text.chars().count(),
    })
}

/// `POST /api/tts` — stream the artifact back with metadata headers.
pub async fn synthesize_stream(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<TtsRequestBody>,
) -> Result<Response, ApiError> {
    let req = validate(&body)?;
    let out = run_pipeline(&state, &ctx, &req).await?;

    let file = tokio::fs::File::open(&out.audio_path)
        .await
        .map_err(|err| ApiError::internal("Storage error", err.to_string()))?;

    let PipelineOutput {
        artifacts,
        filename,
        file_index,
        duration_secs,
        size_bytes,
        format,
        ..
    } = out;

    // The guard rides inside the body stream: it drops (and thus
    // schedules deletion, after the grace delay) only once the transport
    // has consumed the stream or abandoned it.
    let body_stream = async_stream::stream! {
        let _artifacts = artifacts;
        let mut reader = ReaderStream::new(file);
        while let Some(chunk) = reader.next().await {
            yield chunk;
        }
    };

    let response = Response::builder()
        .header(header::CONTENT_TYPE, format.content_type())
        .header(header::CONTENT_LENGTH, size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .header("X-Audio-Duration", format!("{duration_secs:.2}"))
        .header("X-Audio-Duration-Formatted", format_duration(duration_secs))
        .header("X-File-Size", size_bytes)
        .header("X-Filename", filename)
        .header("X-File-Index", file_index)
        .body(Body::from_stream(body_stream))
        .unwrap_or_else(|_| Response::new(Body::empty()));

    Ok(response)
}

#[derive(Debug, Serialize)]
pub struct FileInfo {
    pub filename: String,
    pub duration: f64,
    pub duration_formatted: String,
    pub format: &'static str,
    pub size: u64,
    pub language: &'static str,
    pub language_name: &'static str,
    pub text_length: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct AudioPayload {
    pub data: String,
    pub content_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TtsJsonResponse {
    pub success: bool,
    pub file_info: FileInfo,
    pub audio: AudioPayload,
}

fn file_info(out: &PipelineOutput) -> FileInfo {
    FileInfo {
        filename: out.filename.clone(),
        duration: (out.duration_secs * 100.0).round() / 100.0,
        duration_formatted: format_duration(out.duration_secs),
        format: out.format.extension(),
        size: out.size_bytes,
        language: out.language.code,
        language_name: out.language.name,
        text_length: out.text_chars,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// `POST /api/tts/complete` (and `/json`) — JSON envelope with the audio
/// embedded as base64.
pub async fn synthesize_json(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<TtsRequestBody>,
) -> Result<Json<TtsJsonResponse>, ApiError> {
    let req = validate(&body)?;
    let out = run_pipeline(&state, &ctx, &req).await?;

    let bytes = tokio::fs::read(&out.audio_path)
        .await
        .map_err(|err| ApiError::internal("Storage error", err.to_string()))?;

    let info = file_info(&out);
    let content_type = out.format.content_type();
    // Bytes are in memory; the files can go now.
    out.artifacts.release().await;

    Ok(Json(TtsJsonResponse {
        success: true,
        file_info: info,
        audio: AudioPayload {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            content_type,
        },
    }))
}

#[derive(Debug, Serialize)]
pub struct SavedAudioResponse {
    pub success: bool,
    pub file_info: FileInfo,
    pub url: String,
}

/// `POST /api/tts/save` — persist the artifact under its display
/// filename and return where to fetch it.
pub async fn synthesize_and_save(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<TtsRequestBody>,
) -> Result<Json<SavedAudioResponse>, ApiError> {
    let req = validate(&body)?;
    let out = run_pipeline(&state, &ctx, &req).await?;

    state
        .audio_store
        .persist(&out.audio_path, &out.filename)
        .await
        .map_err(|err| ApiError::internal("Storage error", err.to_string()))?;

    let info = file_info(&out);
    let url = format!("/audio/{}", out.filename);
    // The durable copy is in place; reclaim the scratch files.
    out.artifacts.release().await;

    Ok(Json(SavedAudioResponse {
        success: true,
        file_info: info,
        url,
    }))
}

#[derive(Debug, Serialize)]
pub struct LanguageEntry {
    pub code: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub success: bool,
    pub supported_languages: BTreeMap<String, LanguageEntry>,
}

/// `GET /api/tts/languages` — every accepted alias with its canonical
/// code and display name.
pub async fn list_languages() -> Json<LanguagesResponse> {
    let supported_languages = language::aliases()
        .map(|(alias, lang)| {
            (
                alias,
                LanguageEntry {
                    code: lang.code,
                    name: lang.name,
                },
            )
        })
        .collect();

    Json(LanguagesResponse {
        success: true,
        supported_languages,
    })
}
