//! HTTP API v1 — the voxlog request surface.
//!
//! Endpoints:
//!
//! - `POST /api/v1/asr`     — Multipart audio upload, returns the transcript
//! - `POST /api/v1/chat`    — Send a diary entry, get a supportive reflection
//! - `POST /api/v1/tts`     — Send text, get WAV audio back
//! - `POST /api/v1/journal` — Composite: transcribe, reflect, synthesize
//! - `GET  /api/v1/health`  — Liveness plus collaborator status
//!
//! Every error leaves as `{ "error": <kind>, "message": <reason> }` with a
//! status derived from the error kind.

use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use voxlog_core::{AudioFormat, Error, UpstreamError};

use crate::SharedState;

/// Build the v1 API router. Nested under "/api/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/asr", post(asr_handler))
        .route("/chat", post(chat_handler))
        .route("/tts", post(tts_handler))
        .route("/journal", post(journal_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

// ── Error mapping ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Wrapper translating the domain error taxonomy into HTTP responses.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError(error)
    }
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Validation { .. } => StatusCode::BAD_REQUEST,
        Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
        Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        // 499 is the nginx convention for a client-closed request.
        Error::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Internal defects are logged with full context and reported generically.
fn public_message(error: &Error) -> String {
    match error {
        Error::Internal(detail) => {
            error!(detail = %detail, "Internal error while handling request");
            "An unexpected error occurred".into()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = ErrorBody {
            error: self.0.kind(),
            message: public_message(&self.0),
        };
        (status, Json(body)).into_response()
    }
}

// ── Multipart helpers ─────────────────────────────────────────────────────

/// The parts a journal or ASR upload may carry.
struct AudioUpload {
    audio: Vec<u8>,
    format: AudioFormat,
    user_id: Option<String>,
}

async fn read_audio_upload(multipart: &mut Multipart) -> Result<AudioUpload, ApiError> {
    let mut upload: Option<(Vec<u8>, AudioFormat)> = None;
    let mut user_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("invalid multipart payload: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let mime = field
                    .content_type()
                    .map(str::to_string)
                    .ok_or_else(|| Error::validation("'file' field is missing a content type"))?;
                let format = AudioFormat::from_mime(&mime).ok_or_else(|| {
                    Error::validation(format!(
                        "unsupported audio content type '{mime}' (expected WAV, MP3, or M4A)"
                    ))
                })?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::validation(format!("failed to read 'file' field: {e}")))?;
                upload = Some((bytes.to_vec(), format));
            }
            Some("user_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| Error::validation(format!("failed to read 'user_id' field: {e}")))?;
                if !value.is_empty() {
                    user_id = Some(value);
                }
            }
            _ => {} // ignore unknown fields
        }
    }

    let (audio, format) =
        upload.ok_or_else(|| Error::validation("multipart upload is missing the 'file' field"))?;

    Ok(AudioUpload {
        audio,
        format,
        user_id,
    })
}

// ── ASR ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct AsrResponse {
    text: String,
    format: AudioFormat,
    size_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<f64>,
    timestamp: DateTime<Utc>,
}

async fn asr_handler(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<AsrResponse>, ApiError> {
    let upload = read_audio_upload(&mut multipart).await?;

    info!(size_bytes = upload.audio.len(), format = %upload.format, "ASR request received");

    let result = state
        .orchestrator
        .handle_transcribe(upload.audio, upload.format)
        .await?;

    Ok(Json(AsrResponse {
        text: result.text,
        format: result.format,
        size_bytes: result.size_bytes,
        duration_seconds: result.duration_seconds,
        timestamp: Utc::now(),
    }))
}

// ── Chat ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    timestamp: DateTime<Utc>,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    // Callers without an id share one anonymous session.
    let session_id = payload.user_id.as_deref().unwrap_or("default");

    info!(session_id, message_chars = payload.message.len(), "Chat request received");

    let response = state
        .orchestrator
        .handle_chat(session_id, &payload.message)
        .await?;

    Ok(Json(ChatResponse {
        response,
        timestamp: Utc::now(),
    }))
}

// ── TTS ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TtsRequest {
    text: String,
}

async fn tts_handler(
    State(state): State<SharedState>,
    Json(payload): Json<TtsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!(text_chars = payload.text.len(), "TTS request received");

    let result = state.orchestrator.handle_tts(&payload.text).await?;

    Ok((
        [(header::CONTENT_TYPE, result.format.mime_type())],
        result.audio,
    ))
}

// ── Journal (composite pipeline) ──────────────────────────────────────────

#[derive(Serialize)]
struct JournalResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    timestamp: DateTime<Utc>,
}

async fn journal_handler(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Response {
    let upload = match read_audio_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(e) => return e.into_response(),
    };
    let session_id = upload.user_id.unwrap_or_else(|| "default".to_string());
    let request_id = uuid::Uuid::new_v4();

    info!(%request_id, session_id = %session_id, size_bytes = upload.audio.len(), "Journal request received");

    let outcome = state
        .orchestrator
        .handle_full_cycle(&session_id, upload.audio, upload.format)
        .await;

    let status = match &outcome.error {
        None => StatusCode::OK,
        Some(e) => status_for(e),
    };

    let body = JournalResponse {
        transcription: outcome.transcription.map(|t| t.text),
        response: outcome.response,
        audio_base64: outcome
            .synthesis
            .as_ref()
            .map(|s| base64::engine::general_purpose::STANDARD.encode(&s.audio)),
        audio_format: outcome.synthesis.as_ref().map(|s| s.format.to_string()),
        error: outcome.error.as_ref().map(|e| e.kind()),
        message: outcome.error.as_ref().map(public_message),
        timestamp: Utc::now(),
    };

    (status, Json(body)).into_response()
}

// ── Health ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    services: ServiceStatuses,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct ServiceStatuses {
    transcription: &'static str,
    chat: &'static str,
    synthesis: &'static str,
}

async fn probe(
    check: impl std::future::Future<Output = Result<bool, UpstreamError>>,
) -> &'static str {
    match tokio::time::timeout(Duration::from_secs(5), check).await {
        Ok(Ok(true)) => "connected",
        Ok(Ok(false)) => "error",
        Ok(Err(_)) => "unreachable",
        Err(_) => "timeout",
    }
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let (transcription, chat, synthesis) = tokio::join!(
        probe(state.transcriber.health_check()),
        probe(state.chat.health_check()),
        probe(state.synthesizer.health_check()),
    );

    let all_connected = [transcription, chat, synthesis]
        .iter()
        .all(|s| *s == "connected");

    Json(HealthResponse {
        status: if all_connected { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        services: ServiceStatuses {
            transcription,
            chat,
            synthesis,
        },
        timestamp: Utc::now(),
    })
}
