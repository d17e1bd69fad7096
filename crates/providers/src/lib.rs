//! Concrete collaborator integrations for voxlog.
//!
//! The core crate defines the three collaborator traits; this crate
//! supplies the cloud implementations and the selection logic that picks
//! one per capability from configuration at startup. Nothing outside this
//! crate names a provider — the pipeline and gateway only see trait
//! objects.

pub mod anthropic;
pub mod huggingface;
pub mod openai_compat;

use std::sync::Arc;

use voxlog_config::{ChatConfig, SpeechConfig};
use voxlog_core::collaborator::{Converse, SpeechFromText, SpeechToText};

use crate::anthropic::AnthropicChat;
use crate::huggingface::HfSpeechClient;
use crate::openai_compat::OpenAiCompatChat;

/// Build the chat collaborator selected by configuration.
///
/// `provider = "anthropic"` uses the native Messages API; everything else
/// goes through the OpenAI-compatible path with a per-provider default
/// base URL, overridable via `chat.base_url`.
pub fn build_chat(config: &ChatConfig) -> Arc<dyn Converse> {
    let api_key = config.api_key.clone().unwrap_or_default();

    if config.provider == "anthropic" {
        let mut chat = AnthropicChat::new(
            api_key,
            &config.model,
            config.temperature,
            config.max_tokens,
        );
        if let Some(ref base_url) = config.base_url {
            chat = chat.with_base_url(base_url);
        }
        return Arc::new(chat);
    }

    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| default_base_url(&config.provider));

    Arc::new(OpenAiCompatChat::new(
        &config.provider,
        base_url,
        api_key,
        &config.model,
        config.temperature,
        config.max_tokens,
    ))
}

/// Build the shared speech client and hand it out under both traits.
pub fn build_speech(config: &SpeechConfig) -> (Arc<dyn SpeechToText>, Arc<dyn SpeechFromText>) {
    let api_key = config.api_key.clone().unwrap_or_default();
    let mut client = HfSpeechClient::new(api_key, &config.asr_model, &config.tts_model);
    if let Some(ref base_url) = config.base_url {
        client = client.with_base_url(base_url);
    }
    let client = Arc::new(client);
    let transcriber: Arc<dyn SpeechToText> = client.clone();
    let synthesizer: Arc<dyn SpeechFromText> = client;
    (transcriber, synthesizer)
}

/// Default base URL for well-known OpenAI-compatible providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn chat_selection_by_provider() {
        let mut config = ChatConfig::default();
        assert_eq!(build_chat(&config).name(), "openai");

        config.provider = "anthropic".into();
        assert_eq!(build_chat(&config).name(), "anthropic");

        config.provider = "groq".into();
        assert_eq!(build_chat(&config).name(), "groq");
    }

    #[test]
    fn speech_client_serves_both_capabilities() {
        let config = SpeechConfig::default();
        let (asr, tts) = build_speech(&config);
        assert_eq!(asr.name(), "huggingface");
        assert_eq!(tts.name(), "huggingface");
    }
}
