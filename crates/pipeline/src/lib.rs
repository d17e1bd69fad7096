//! Prompt assembly, external service adapters, and request orchestration
//! for the voxlog gateway.
//!
//! This crate is the provider-agnostic middle of the system: the gateway
//! hands it typed requests, it coordinates the session store and the
//! collaborator adapters, and every failure comes back as one of the
//! kinds in `voxlog_core::Error`.

pub mod adapters;
pub mod orchestrator;
pub mod prompt;

pub use adapters::{AsrAdapter, ChatAdapter, TtsAdapter};
pub use orchestrator::{FullCycleOutcome, Orchestrator};
pub use prompt::{PromptAssembler, SYSTEM_DIRECTIVE};
