//! Collaborator traits — the abstraction over external AI services.
//!
//! Each external capability (speech-to-text, conversational LLM,
//! text-to-speech) is one trait. Concrete integrations live in the
//! providers crate and are selected from configuration at startup; the
//! pipeline adapters call these traits without knowing which service is
//! behind them — cloud API, local model, or test mock.
//!
//! Implementations report failures as [`UpstreamError`] and nothing else.
//! Deadlines are owned by the calling adapter, not by the collaborator.

use async_trait::async_trait;

use crate::audio::AudioFormat;
use crate::error::UpstreamError;
use crate::message::ChatPrompt;

/// A speech-to-text collaborator.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// A human-readable name for this collaborator (e.g., "huggingface").
    fn name(&self) -> &str;

    /// Transcribe an audio payload to text.
    ///
    /// An empty transcript is a valid result — silence transcribes to
    /// nothing, not to an error.
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        format: AudioFormat,
    ) -> std::result::Result<String, UpstreamError>;

    /// Health check — can we reach the collaborator?
    async fn health_check(&self) -> std::result::Result<bool, UpstreamError> {
        Ok(true)
    }
}

/// A conversational LLM collaborator.
#[async_trait]
pub trait Converse: Send + Sync {
    fn name(&self) -> &str;

    /// Send a role-tagged prompt, get the reply text back verbatim.
    async fn converse(&self, prompt: ChatPrompt) -> std::result::Result<String, UpstreamError>;

    async fn health_check(&self) -> std::result::Result<bool, UpstreamError> {
        Ok(true)
    }
}

/// A text-to-speech collaborator.
#[async_trait]
pub trait SpeechFromText: Send + Sync {
    fn name(&self) -> &str;

    /// Synthesize speech for the given text. Returns raw audio bytes.
    async fn synthesize(&self, text: &str) -> std::result::Result<Vec<u8>, UpstreamError>;

    async fn health_check(&self) -> std::result::Result<bool, UpstreamError> {
        Ok(true)
    }
}
