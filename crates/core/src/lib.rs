//! # Voxlog Core
//!
//! Domain types, collaborator traits, and error definitions for the voxlog
//! voice journaling gateway. This crate has **zero framework dependencies** —
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Each external AI capability (speech-to-text, conversational LLM,
//! text-to-speech) is defined as a trait here. Concrete integrations live in
//! the providers crate and are selected from configuration at startup. This
//! enables:
//! - Swapping the service behind any capability without touching
//!   orchestration or memory logic
//! - Easy testing with scripted mock collaborators
//! - Clean dependency graph (all crates depend inward on core)

pub mod audio;
pub mod collaborator;
pub mod error;
pub mod message;

// Re-export key types at crate root for ergonomics
pub use audio::{AudioFormat, SynthesisResult, TranscriptionResult};
pub use collaborator::{Converse, SpeechFromText, SpeechToText};
pub use error::{Error, Result, ServiceKind, UpstreamError};
pub use message::{ChatMessage, ChatPrompt, Role, Turn};
