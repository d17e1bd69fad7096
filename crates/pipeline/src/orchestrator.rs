//! Request orchestration — sequences adapter calls and memory updates.
//!
//! Every request moves through the same phases: received, validated,
//! dispatched, then succeeded or failed. Memory is only touched on the
//! chat path, and only committed once the provider call has succeeded,
//! so a failed exchange never leaves a half-written turn pair behind.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use voxlog_core::{AudioFormat, Error, Result, SynthesisResult, TranscriptionResult, Turn};
use voxlog_memory::SessionStore;

use crate::adapters::{AsrAdapter, ChatAdapter, TtsAdapter};
use crate::prompt::PromptAssembler;

/// The outcome of the composite journal pipeline.
///
/// Stages that completed before a failure keep their outputs, so the
/// caller still receives the transcription when chat or synthesis fails.
#[derive(Debug, Default)]
pub struct FullCycleOutcome {
    pub transcription: Option<TranscriptionResult>,
    pub response: Option<String>,
    pub synthesis: Option<SynthesisResult>,
    pub error: Option<Error>,
}

impl FullCycleOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Sequences the three adapters and the session store per request.
pub struct Orchestrator {
    store: Arc<SessionStore>,
    assembler: PromptAssembler,
    asr: AsrAdapter,
    chat: ChatAdapter,
    tts: TtsAdapter,
    full_cycle_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<SessionStore>,
        assembler: PromptAssembler,
        asr: AsrAdapter,
        chat: ChatAdapter,
        tts: TtsAdapter,
        full_cycle_timeout: Duration,
    ) -> Self {
        Self {
            store,
            assembler,
            asr,
            chat,
            tts,
            full_cycle_timeout,
        }
    }

    /// The session store backing the chat path.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Transcribe an audio payload. No memory interaction.
    pub async fn handle_transcribe(
        &self,
        audio: Vec<u8>,
        format: AudioFormat,
    ) -> Result<TranscriptionResult> {
        self.asr.transcribe(audio, format).await
    }

    /// One chat exchange for a session.
    ///
    /// The session guard is held across the whole read-dispatch-append
    /// sequence, so concurrent exchanges against the same session are
    /// serialized while other sessions proceed untouched. Both turns of
    /// the exchange are appended together, and only on provider success.
    pub async fn handle_chat(&self, session_id: &str, message: &str) -> Result<String> {
        if session_id.is_empty() {
            return Err(Error::validation("session id must not be empty"));
        }
        let message = message.trim();

        let session = self.store.get_or_create(session_id).await;
        let mut history = session.lock().await;

        let prompt = self.assembler.build(&history.turns(), message)?;
        debug!(session_id, turns = history.len(), "Chat exchange dispatched");

        let reply = self.chat.reflect(prompt).await?;

        history.push(Turn::user(message));
        history.push(Turn::assistant(reply.clone()));
        info!(session_id, reply_chars = reply.len(), "Chat exchange committed");

        Ok(reply)
    }

    /// Synthesize speech for a text. No memory interaction.
    pub async fn handle_tts(&self, text: &str) -> Result<SynthesisResult> {
        self.tts.synthesize(text).await
    }

    /// The composite journal pipeline: transcribe, reflect, synthesize.
    ///
    /// Stops at the first failing stage and reports its error alongside
    /// whatever earlier stages produced. An elapsed end-to-end deadline
    /// surfaces as [`Error::Cancelled`]; an abandoned exchange never
    /// mutates memory because appends only happen inside a successful
    /// `handle_chat`.
    pub async fn handle_full_cycle(
        &self,
        session_id: &str,
        audio: Vec<u8>,
        format: AudioFormat,
    ) -> FullCycleOutcome {
        let deadline = tokio::time::Instant::now() + self.full_cycle_timeout;
        let mut outcome = FullCycleOutcome::default();

        let transcription =
            match tokio::time::timeout_at(deadline, self.handle_transcribe(audio, format)).await {
                Err(_) => {
                    outcome.error = Some(Error::Cancelled);
                    return outcome;
                }
                Ok(Err(e)) => {
                    outcome.error = Some(e);
                    return outcome;
                }
                Ok(Ok(t)) => t,
            };
        outcome.transcription = Some(transcription.clone());

        let reply = match tokio::time::timeout_at(
            deadline,
            self.handle_chat(session_id, &transcription.text),
        )
        .await
        {
            Err(_) => {
                outcome.error = Some(Error::Cancelled);
                return outcome;
            }
            Ok(Err(e)) => {
                outcome.error = Some(e);
                return outcome;
            }
            Ok(Ok(r)) => r,
        };
        outcome.response = Some(reply.clone());

        match tokio::time::timeout_at(deadline, self.handle_tts(&reply)).await {
            Err(_) => outcome.error = Some(Error::Cancelled),
            Ok(Err(e)) => outcome.error = Some(e),
            Ok(Ok(synthesis)) => outcome.synthesis = Some(synthesis),
        }

        outcome
    }
}
