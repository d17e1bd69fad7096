//! HTTP API gateway for voxlog.
//!
//! Exposes the v1 API (ASR, chat, TTS, the composite journal pipeline,
//! and health) plus a root service-info card.
//!
//! Built on Axum; layers applied to the full router:
//! - Request body size limit sized from the configured max audio upload
//! - CORS with origins from configuration
//! - HTTP trace logging

pub mod api_v1;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use voxlog_config::AppConfig;
use voxlog_core::collaborator::{Converse, SpeechFromText, SpeechToText};
use voxlog_memory::SessionStore;
use voxlog_pipeline::{AsrAdapter, ChatAdapter, Orchestrator, PromptAssembler, TtsAdapter};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub orchestrator: Arc<Orchestrator>,
    // Collaborator handles kept for health probing; request traffic goes
    // through the orchestrator only.
    pub transcriber: Arc<dyn SpeechToText>,
    pub chat: Arc<dyn Converse>,
    pub synthesizer: Arc<dyn SpeechFromText>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the full router with all gateway routes and layers.
pub fn build_router(state: SharedState) -> Router {
    // Multipart framing adds overhead on top of the audio payload itself.
    let body_limit = state.config.limits.max_audio_bytes() + 1024 * 1024;
    let cors = cors_layer(&state.config.gateway.cors_origins);

    Router::new()
        .route("/", get(root_handler))
        .nest("/api/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

/// Wire collaborators, adapters, and the orchestrator from configuration.
pub fn build_state(config: AppConfig) -> SharedState {
    let (transcriber, synthesizer) = voxlog_providers::build_speech(&config.speech);
    let chat = voxlog_providers::build_chat(&config.chat);

    let store = Arc::new(SessionStore::new(
        config.limits.memory_turns,
        config.limits.max_sessions,
    ));

    let orchestrator = Arc::new(Orchestrator::new(
        store,
        PromptAssembler::new(config.limits.max_message_chars),
        AsrAdapter::new(
            transcriber.clone(),
            config.limits.max_audio_bytes(),
            config.limits.allowed_audio_formats(),
            Duration::from_secs(config.timeouts.asr_secs),
        ),
        ChatAdapter::new(chat.clone(), Duration::from_secs(config.timeouts.chat_secs)),
        TtsAdapter::new(
            synthesizer.clone(),
            config.limits.max_tts_chars,
            Duration::from_secs(config.timeouts.tts_secs),
        ),
        Duration::from_secs(config.timeouts.full_cycle_secs),
    ));

    Arc::new(GatewayState {
        config,
        orchestrator,
        transcriber,
        chat,
        synthesizer,
    })
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let app = build_router(build_state(config));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `GET /` — service info card.
async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "voxlog",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "AI-powered voice journaling gateway",
        "health": "/api/v1/health",
        "endpoints": {
            "asr": "/api/v1/asr",
            "chat": "/api/v1/chat",
            "tts": "/api/v1/tts",
            "journal": "/api/v1/journal",
        },
    }))
}
