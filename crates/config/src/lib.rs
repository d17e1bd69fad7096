//! Configuration loading, validation, and management for voxlog.
//!
//! Loads configuration from `~/.voxlog/config.toml` with environment
//! variable overrides for API keys. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use voxlog_core::AudioFormat;

/// The root configuration structure.
///
/// Maps directly to `~/.voxlog/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Conversational LLM collaborator settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// Speech collaborator (ASR + TTS) settings
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Payload and memory bounds
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Per-adapter deadlines
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("gateway", &self.gateway)
            .field("chat", &self.chat)
            .field("speech", &self.speech)
            .field("limits", &self.limits)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by the CORS layer.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "http://localhost:8000".into(),
    ]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// "openai", "anthropic", or any OpenAI-compatible provider name.
    #[serde(default = "default_chat_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the provider base URL (for proxies or self-hosted endpoints).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_chat_provider() -> String {
    "openai".into()
}
fn default_chat_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    500
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: default_chat_provider(),
            api_key: None,
            base_url: None,
            model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Hugging Face Inference API token, shared by ASR and TTS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_asr_model")]
    pub asr_model: String,

    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Override the Inference API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_asr_model() -> String {
    "openai/whisper-large-v3".into()
}
fn default_tts_model() -> String {
    "facebook/mms-tts-eng".into()
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &redact(&self.api_key))
            .field("asr_model", &self.asr_model)
            .field("tts_model", &self.tts_model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            asr_model: default_asr_model(),
            tts_model: default_tts_model(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Turns retained per session. 0 is legal and means stateless chat.
    #[serde(default = "default_memory_turns")]
    pub memory_turns: usize,

    /// Maximum number of live sessions; oldest-created is evicted beyond this.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    #[serde(default = "default_max_audio_mb")]
    pub max_audio_mb: usize,

    /// Accepted upload formats ("wav", "mp3", "m4a").
    #[serde(default = "default_allowed_formats")]
    pub allowed_formats: Vec<String>,

    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    #[serde(default = "default_max_tts_chars")]
    pub max_tts_chars: usize,
}

fn default_memory_turns() -> usize {
    5
}
fn default_max_sessions() -> usize {
    1000
}
fn default_max_audio_mb() -> usize {
    25
}
fn default_allowed_formats() -> Vec<String> {
    vec!["wav".into(), "mp3".into(), "m4a".into()]
}
fn default_max_message_chars() -> usize {
    5000
}
fn default_max_tts_chars() -> usize {
    2000
}

impl LimitsConfig {
    pub fn max_audio_bytes(&self) -> usize {
        self.max_audio_mb * 1024 * 1024
    }

    /// Parse the configured format names. Errors on unknown names are
    /// caught by `validate()` at load time.
    pub fn allowed_audio_formats(&self) -> Vec<AudioFormat> {
        self.allowed_formats
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect()
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            memory_turns: default_memory_turns(),
            max_sessions: default_max_sessions(),
            max_audio_mb: default_max_audio_mb(),
            allowed_formats: default_allowed_formats(),
            max_message_chars: default_max_message_chars(),
            max_tts_chars: default_max_tts_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_asr_secs")]
    pub asr_secs: u64,

    #[serde(default = "default_chat_secs")]
    pub chat_secs: u64,

    #[serde(default = "default_tts_secs")]
    pub tts_secs: u64,

    /// End-to-end deadline for the composite journal pipeline.
    #[serde(default = "default_full_cycle_secs")]
    pub full_cycle_secs: u64,
}

fn default_asr_secs() -> u64 {
    60
}
fn default_chat_secs() -> u64 {
    30
}
fn default_tts_secs() -> u64 {
    60
}
fn default_full_cycle_secs() -> u64 {
    120
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            asr_secs: default_asr_secs(),
            chat_secs: default_chat_secs(),
            tts_secs: default_tts_secs(),
            full_cycle_secs: default_full_cycle_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.voxlog/config.toml).
    ///
    /// Environment variables override file values for API keys:
    /// - `VOXLOG_LLM_API_KEY`, then `OPENAI_API_KEY` / `ANTHROPIC_API_KEY`
    /// - `VOXLOG_HF_API_KEY`, then `HF_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.chat.api_key.is_none() {
            config.chat.api_key = std::env::var("VOXLOG_LLM_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok());
        }

        if config.speech.api_key.is_none() {
            config.speech.api_key = std::env::var("VOXLOG_HF_API_KEY")
                .ok()
                .or_else(|| std::env::var("HF_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("VOXLOG_CHAT_PROVIDER") {
            config.chat.provider = provider;
        }

        if let Ok(model) = std::env::var("VOXLOG_CHAT_MODEL") {
            config.chat.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".voxlog")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chat.temperature < 0.0 || self.chat.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "chat.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.limits.memory_turns > 20 {
            return Err(ConfigError::ValidationError(
                "limits.memory_turns must be at most 20".into(),
            ));
        }

        if self.limits.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_sessions must be at least 1".into(),
            ));
        }

        if self.limits.max_audio_mb == 0 || self.limits.max_audio_mb > 100 {
            return Err(ConfigError::ValidationError(
                "limits.max_audio_mb must be between 1 and 100".into(),
            ));
        }

        for name in &self.limits.allowed_formats {
            if name.parse::<AudioFormat>().is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "limits.allowed_formats contains unknown format '{name}'"
                )));
            }
        }

        if self.limits.allowed_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "limits.allowed_formats must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Required API keys that are not set. The serve and doctor commands
    /// report these before any request is accepted.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.speech.api_key.is_none() {
            missing.push("VOXLOG_HF_API_KEY");
        }
        if self.chat.api_key.is_none() {
            missing.push("VOXLOG_LLM_API_KEY");
        }
        missing
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            chat: ChatConfig::default(),
            speech: SpeechConfig::default(),
            limits: LimitsConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.limits.memory_turns, 5);
        assert_eq!(config.chat.model, "gpt-4o-mini");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.limits.max_audio_mb, config.limits.max_audio_mb);
        assert_eq!(parsed.speech.asr_model, config.speech.asr_model);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.chat.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_memory_turns_is_legal() {
        let mut config = AppConfig::default();
        config.limits.memory_turns = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn oversized_memory_turns_rejected() {
        let mut config = AppConfig::default();
        config.limits.memory_turns = 21;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_audio_format_rejected() {
        let mut config = AppConfig::default();
        config.limits.allowed_formats = vec!["wav".into(), "ogg".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().gateway.port, 8000);
    }

    #[test]
    fn max_audio_bytes_conversion() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.max_audio_bytes(), 25 * 1024 * 1024);
    }

    #[test]
    fn allowed_formats_parse() {
        let limits = LimitsConfig::default();
        let formats = limits.allowed_audio_formats();
        assert_eq!(formats.len(), 3);
        assert!(formats.contains(&AudioFormat::Wav));
    }

    #[test]
    fn missing_keys_reported() {
        let config = AppConfig::default();
        let missing = config.missing_keys();
        assert!(missing.contains(&"VOXLOG_HF_API_KEY"));
        assert!(missing.contains(&"VOXLOG_LLM_API_KEY"));

        let mut configured = AppConfig::default();
        configured.chat.api_key = Some("sk-test".into());
        configured.speech.api_key = Some("hf_test".into());
        assert!(configured.missing_keys().is_empty());
    }

    #[test]
    fn debug_redacts_api_keys() {
        let mut config = AppConfig::default();
        config.chat.api_key = Some("sk-secret-value".into());
        config.speech.api_key = Some("hf-secret-value".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-value"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[gateway]
port = 9100

[limits]
memory_turns = 3
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gateway.port, 9100);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.limits.memory_turns, 3);
        assert_eq!(config.limits.max_audio_mb, 25);
        assert_eq!(config.timeouts.chat_secs, 30);
    }
}
