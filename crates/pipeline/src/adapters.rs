//! External service adapters — one per collaborator capability.
//!
//! Each adapter enforces local preconditions before any network call,
//! bounds the collaborator call with a deadline, and translates every
//! failure into the gateway error taxonomy. A raw collaborator error
//! never crosses an adapter boundary.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use voxlog_core::collaborator::{Converse, SpeechFromText, SpeechToText};
use voxlog_core::{
    AudioFormat, ChatPrompt, Error, Result, ServiceKind, SynthesisResult, TranscriptionResult,
    UpstreamError,
};

/// Map the outcome of a deadline-bounded collaborator call into the
/// gateway taxonomy. Collaborator-reported timeouts and the local
/// deadline both surface as [`Error::Timeout`] so observability sees one
/// category.
fn map_outcome<T>(
    service: ServiceKind,
    timeout: Duration,
    outcome: std::result::Result<std::result::Result<T, UpstreamError>, tokio::time::error::Elapsed>,
) -> Result<T> {
    let timeout_secs = timeout.as_secs();
    match outcome {
        Err(_elapsed) => Err(Error::Timeout {
            service,
            timeout_secs,
        }),
        Ok(Err(UpstreamError::Timeout(_))) => Err(Error::Timeout {
            service,
            timeout_secs,
        }),
        Ok(Err(source)) => Err(Error::Upstream { service, source }),
        Ok(Ok(value)) => Ok(value),
    }
}

/// Adapter around the speech-to-text collaborator.
pub struct AsrAdapter {
    speech: Arc<dyn SpeechToText>,
    max_bytes: usize,
    allowed_formats: Vec<AudioFormat>,
    timeout: Duration,
}

impl AsrAdapter {
    pub fn new(
        speech: Arc<dyn SpeechToText>,
        max_bytes: usize,
        allowed_formats: Vec<AudioFormat>,
        timeout: Duration,
    ) -> Self {
        Self {
            speech,
            max_bytes,
            allowed_formats,
            timeout,
        }
    }

    /// Transcribe an uploaded audio payload.
    ///
    /// An empty transcript is a valid result; silence is not an error.
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        format: AudioFormat,
    ) -> Result<TranscriptionResult> {
        if audio.is_empty() {
            return Err(Error::validation("audio payload is empty"));
        }
        if audio.len() > self.max_bytes {
            return Err(Error::validation(format!(
                "audio payload of {} bytes exceeds the maximum of {} bytes",
                audio.len(),
                self.max_bytes
            )));
        }
        if !self.allowed_formats.contains(&format) {
            let allowed: Vec<String> =
                self.allowed_formats.iter().map(|f| f.to_string()).collect();
            return Err(Error::validation(format!(
                "audio format '{format}' is not allowed (allowed: {})",
                allowed.join(", ")
            )));
        }

        let size_bytes = audio.len();
        debug!(collaborator = self.speech.name(), size_bytes, %format, "Dispatching transcription");

        let text = map_outcome(
            ServiceKind::Transcription,
            self.timeout,
            tokio::time::timeout(self.timeout, self.speech.transcribe(audio, format)).await,
        )?;

        Ok(TranscriptionResult {
            text,
            format,
            size_bytes,
            duration_seconds: None,
        })
    }
}

/// Adapter around the conversational LLM collaborator.
pub struct ChatAdapter {
    chat: Arc<dyn Converse>,
    timeout: Duration,
}

impl ChatAdapter {
    pub fn new(chat: Arc<dyn Converse>, timeout: Duration) -> Self {
        Self { chat, timeout }
    }

    /// Send an assembled prompt, returning the reply text verbatim.
    ///
    /// A prompt without the system directive or a user message can only
    /// come from a bug upstream of this adapter, so it is reported as an
    /// internal defect rather than caller error.
    pub async fn reflect(&self, prompt: ChatPrompt) -> Result<String> {
        if !prompt.has_system_directive() || !prompt.has_user_message() {
            return Err(Error::Internal(
                "chat prompt is missing the system directive or a user message".into(),
            ));
        }

        debug!(collaborator = self.chat.name(), messages = prompt.messages.len(), "Dispatching chat");

        map_outcome(
            ServiceKind::Chat,
            self.timeout,
            tokio::time::timeout(self.timeout, self.chat.converse(prompt)).await,
        )
    }
}

/// Adapter around the text-to-speech collaborator.
pub struct TtsAdapter {
    synth: Arc<dyn SpeechFromText>,
    max_chars: usize,
    timeout: Duration,
}

impl TtsAdapter {
    pub fn new(synth: Arc<dyn SpeechFromText>, max_chars: usize, timeout: Duration) -> Self {
        Self {
            synth,
            max_chars,
            timeout,
        }
    }

    /// Synthesize speech for the given text. Output is declared WAV.
    pub async fn synthesize(&self, text: &str) -> Result<SynthesisResult> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::validation("text must not be empty"));
        }
        if text.chars().count() > self.max_chars {
            return Err(Error::validation(format!(
                "text exceeds the maximum length of {} characters",
                self.max_chars
            )));
        }

        debug!(collaborator = self.synth.name(), chars = text.len(), "Dispatching synthesis");

        let audio = map_outcome(
            ServiceKind::Synthesis,
            self.timeout,
            tokio::time::timeout(self.timeout, self.synth.synthesize(text)).await,
        )?;

        Ok(SynthesisResult {
            audio,
            format: AudioFormat::Wav,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAsr {
        calls: AtomicUsize,
        reply: std::result::Result<String, UpstreamError>,
    }

    impl CountingAsr {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: Ok(text.into()),
            })
        }

        fn failing(err: UpstreamError) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: Err(err),
            })
        }
    }

    #[async_trait]
    impl SpeechToText for CountingAsr {
        fn name(&self) -> &str {
            "mock_asr"
        }

        async fn transcribe(
            &self,
            _audio: Vec<u8>,
            _format: AudioFormat,
        ) -> std::result::Result<String, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    struct SlowChat;

    #[async_trait]
    impl Converse for SlowChat {
        fn name(&self) -> &str {
            "slow_chat"
        }

        async fn converse(&self, _prompt: ChatPrompt) -> std::result::Result<String, UpstreamError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".into())
        }
    }

    struct FixedSynth;

    #[async_trait]
    impl SpeechFromText for FixedSynth {
        fn name(&self) -> &str {
            "mock_tts"
        }

        async fn synthesize(&self, _text: &str) -> std::result::Result<Vec<u8>, UpstreamError> {
            Ok(vec![0x52, 0x49, 0x46, 0x46])
        }
    }

    fn all_formats() -> Vec<AudioFormat> {
        vec![AudioFormat::Wav, AudioFormat::Mp3, AudioFormat::M4a]
    }

    #[tokio::test]
    async fn empty_payload_never_reaches_collaborator() {
        let speech = CountingAsr::ok("hello");
        let adapter = AsrAdapter::new(
            speech.clone(),
            1024,
            all_formats(),
            Duration::from_secs(5),
        );

        let err = adapter
            .transcribe(Vec::new(), AudioFormat::Wav)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_payload_rejected_before_dispatch() {
        let speech = CountingAsr::ok("hello");
        let adapter = AsrAdapter::new(speech.clone(), 8, all_formats(), Duration::from_secs(5));

        let err = adapter
            .transcribe(vec![0u8; 16], AudioFormat::Wav)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn disallowed_format_rejected() {
        let speech = CountingAsr::ok("hello");
        let adapter = AsrAdapter::new(
            speech.clone(),
            1024,
            vec![AudioFormat::Wav],
            Duration::from_secs(5),
        );

        let err = adapter
            .transcribe(vec![1, 2, 3], AudioFormat::Mp3)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_transcript_is_a_valid_result() {
        let adapter = AsrAdapter::new(
            CountingAsr::ok(""),
            1024,
            all_formats(),
            Duration::from_secs(5),
        );

        let result = adapter
            .transcribe(vec![1, 2, 3], AudioFormat::Wav)
            .await
            .unwrap();
        assert!(result.text.is_empty());
        assert_eq!(result.size_bytes, 3);
        assert_eq!(result.format, AudioFormat::Wav);
    }

    #[tokio::test]
    async fn upstream_failure_is_attributed() {
        let adapter = AsrAdapter::new(
            CountingAsr::failing(UpstreamError::Api {
                status_code: 503,
                message: "model loading".into(),
            }),
            1024,
            all_formats(),
            Duration::from_secs(5),
        );

        let err = adapter
            .transcribe(vec![1, 2, 3], AudioFormat::Wav)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Upstream {
                service: ServiceKind::Transcription,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn collaborator_reported_timeout_maps_to_timeout() {
        let adapter = AsrAdapter::new(
            CountingAsr::failing(UpstreamError::Timeout("deadline".into())),
            1024,
            all_formats(),
            Duration::from_secs(5),
        );

        let err = adapter
            .transcribe(vec![1, 2, 3], AudioFormat::Wav)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Timeout {
                service: ServiceKind::Transcription,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn chat_deadline_elapses_to_timeout() {
        let adapter = ChatAdapter::new(Arc::new(SlowChat), Duration::from_millis(20));
        let prompt = ChatPrompt {
            messages: vec![
                voxlog_core::ChatMessage::system("directive"),
                voxlog_core::ChatMessage::user("hello"),
            ],
        };

        let err = adapter.reflect(prompt).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Timeout {
                service: ServiceKind::Chat,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn malformed_prompt_is_an_internal_defect() {
        let adapter = ChatAdapter::new(Arc::new(SlowChat), Duration::from_secs(5));
        let prompt = ChatPrompt {
            messages: vec![voxlog_core::ChatMessage::user("no directive")],
        };

        let err = adapter.reflect(prompt).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test]
    async fn tts_validations() {
        let adapter = TtsAdapter::new(Arc::new(FixedSynth), 10, Duration::from_secs(5));

        assert!(matches!(
            adapter.synthesize("").await.unwrap_err(),
            Error::Validation { .. }
        ));
        assert!(matches!(
            adapter.synthesize("   ").await.unwrap_err(),
            Error::Validation { .. }
        ));
        assert!(matches!(
            adapter.synthesize("far far too long text").await.unwrap_err(),
            Error::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn tts_declares_wav_output() {
        let adapter = TtsAdapter::new(Arc::new(FixedSynth), 100, Duration::from_secs(5));
        let result = adapter.synthesize("hello").await.unwrap();
        assert_eq!(result.format, AudioFormat::Wav);
        assert!(!result.audio.is_empty());
    }
}
