//! Error types for the voxlog domain.
//!
//! Uses `thiserror` for ergonomic error definitions. The top-level [`Error`]
//! is the complete failure taxonomy a request can surface; collaborator
//! failures are captured separately in [`UpstreamError`] and attributed to a
//! [`ServiceKind`] by the adapter that observed them. No raw transport or
//! provider error is allowed to cross an adapter boundary unmapped.

use thiserror::Error;

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Which external capability a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Speech-to-text (ASR)
    Transcription,
    /// Conversational LLM
    Chat,
    /// Text-to-speech
    Synthesis,
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ServiceKind::Transcription => "transcription",
            ServiceKind::Chat => "chat",
            ServiceKind::Synthesis => "synthesis",
        };
        write!(f, "{name}")
    }
}

/// The top-level error type for all gateway operations.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Caller input violates a precondition. Never retried, never reaches a
    /// collaborator.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// The external collaborator returned a failure or an unexpected
    /// response shape.
    #[error("{service} upstream failure: {source}")]
    Upstream {
        service: ServiceKind,
        #[source]
        source: UpstreamError,
    },

    /// The collaborator did not respond within the configured deadline.
    /// Kept distinct from `Upstream` for observability.
    #[error("{service} call timed out after {timeout_secs}s")]
    Timeout {
        service: ServiceKind,
        timeout_secs: u64,
    },

    /// The caller disconnected or an overall deadline elapsed before
    /// completion.
    #[error("request cancelled before completion")]
    Cancelled,

    /// Any failure not classified above. Always a defect; logged with full
    /// context and reported generically to the caller.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand constructor for validation failures.
    pub fn validation(reason: impl Into<String>) -> Self {
        Error::Validation {
            reason: reason.into(),
        }
    }

    /// The stable error-kind tag used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "ValidationError",
            Error::Upstream { .. } => "UpstreamError",
            Error::Timeout { .. } => "Timeout",
            Error::Cancelled => "Cancelled",
            Error::Internal(_) => "InternalError",
        }
    }
}

/// Failure modes of an external collaborator, as reported by the provider
/// integration that talked to it.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),
}
