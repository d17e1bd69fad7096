//! Hugging Face Inference API integration — speech-to-text and
//! text-to-speech behind one client.
//!
//! ASR posts raw audio bytes to `/models/{model}` and reads `{"text": ...}`
//! back; TTS posts `{"inputs": ...}` and reads raw audio bytes. Both share
//! the same token and base URL.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use voxlog_core::collaborator::{SpeechFromText, SpeechToText};
use voxlog_core::{AudioFormat, UpstreamError};

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Hugging Face Inference API client for both speech capabilities.
pub struct HfSpeechClient {
    base_url: String,
    api_key: String,
    asr_model: String,
    tts_model: String,
    client: reqwest::Client,
}

impl HfSpeechClient {
    pub fn new(
        api_key: impl Into<String>,
        asr_model: impl Into<String>,
        tts_model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            asr_model: asr_model.into(),
            tts_model: tts_model.into(),
            client,
        }
    }

    /// Override the base URL (for proxies or testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    async fn probe_model(&self, model: &str) -> std::result::Result<bool, UpstreamError> {
        let url = format!("{}/status/{}", self.base_url, model);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(map_transport_error)?;
        Ok(response.status().is_success())
    }
}

/// Translate a non-success Inference API status into an [`UpstreamError`].
fn map_error_status(status: u16, body: String) -> UpstreamError {
    match status {
        429 => UpstreamError::RateLimited {
            retry_after_secs: 5,
        },
        401 | 403 => UpstreamError::AuthenticationFailed(
            "Invalid Hugging Face API token or insufficient permissions".into(),
        ),
        _ => UpstreamError::Api {
            status_code: status,
            message: body,
        },
    }
}

/// Translate a reqwest transport failure, keeping timeouts distinct.
fn map_transport_error(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout(e.to_string())
    } else {
        UpstreamError::Network(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct AsrApiResponse {
    text: String,
}

#[async_trait]
impl SpeechToText for HfSpeechClient {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn transcribe(
        &self,
        audio: Vec<u8>,
        format: AudioFormat,
    ) -> std::result::Result<String, UpstreamError> {
        let url = self.model_url(&self.asr_model);

        debug!(model = %self.asr_model, bytes = audio.len(), "Sending transcription request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", format.mime_type())
            .body(audio)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Inference API transcription error");
            return Err(map_error_status(status, body));
        }

        let api_response: AsrApiResponse = response.json().await.map_err(|e| {
            UpstreamError::UnexpectedResponse(format!("Failed to parse transcription: {e}"))
        })?;

        Ok(api_response.text.trim().to_string())
    }

    async fn health_check(&self) -> std::result::Result<bool, UpstreamError> {
        self.probe_model(&self.asr_model).await
    }
}

#[async_trait]
impl SpeechFromText for HfSpeechClient {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn synthesize(&self, text: &str) -> std::result::Result<Vec<u8>, UpstreamError> {
        let url = self.model_url(&self.tts_model);

        debug!(model = %self.tts_model, chars = text.len(), "Sending synthesis request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Inference API synthesis error");
            return Err(map_error_status(status, body));
        }

        let audio = response
            .bytes()
            .await
            .map_err(map_transport_error)?
            .to_vec();

        if audio.is_empty() {
            return Err(UpstreamError::UnexpectedResponse(
                "Synthesis returned an empty audio body".into(),
            ));
        }

        Ok(audio)
    }

    async fn health_check(&self) -> std::result::Result<bool, UpstreamError> {
        self.probe_model(&self.tts_model).await
    }
}
