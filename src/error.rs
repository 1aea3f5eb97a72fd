use crate::context::ContextKey;
use crate::stage::{Phase, StageId};
use thiserror::Error;

/// Errors produced by the pipeline and its components.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No backend credential is available, so the live client cannot be used.
    #[error("completion backend is not configured: set OPENAI_API_KEY")]
    NotConfigured,

    /// The backend was reachable but the call failed or returned unusable data.
    #[error("completion backend call failed: {0}")]
    Backend(#[from] BackendError),

    /// A stage read a context key that no earlier stage wrote.
    #[error("context key '{0}' has not been written by an earlier stage")]
    MissingContextKey(ContextKey),

    /// A prompt failed validation (empty, whitespace-only or too long).
    #[error("invalid prompt: {0}")]
    InvalidPrompt(String),

    /// Invalid flow wiring detected at build time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Console I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error escaped one of a stage's phases.
    #[error("stage '{stage}' failed during {phase}: {source}")]
    StageFailed {
        stage: StageId,
        phase: Phase,
        #[source]
        source: Box<PipelineError>,
    },

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

/// Failures of a completion backend call.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status code with the response body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body was not the expected JSON shape.
    #[error("response decoding failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response parsed but carried no generated text.
    #[error("response contained no generated text")]
    EmptyResponse,
}

/// Coarse classification used for operator-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fix configuration (credentials, endpoint).
    NotConfigured,
    /// The backend misbehaved; retrying later may help.
    BackendFailure,
    /// Internal defect in how the flow is wired.
    WiringDefect,
    /// The operator supplied unusable input.
    InvalidInput,
    /// Console or other local I/O failed.
    Io,
}

impl PipelineError {
    /// Unwrap [`PipelineError::StageFailed`] layers down to the originating error.
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::StageFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stage and phase where the error escaped, if it came out of a stage.
    pub fn location(&self) -> Option<(StageId, Phase)> {
        match self {
            PipelineError::StageFailed { stage, phase, .. } => Some((*stage, *phase)),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            PipelineError::NotConfigured => ErrorCategory::NotConfigured,
            PipelineError::Backend(_) => ErrorCategory::BackendFailure,
            PipelineError::MissingContextKey(_) | PipelineError::InvalidConfig(_) => {
                ErrorCategory::WiringDefect
            }
            PipelineError::InvalidPrompt(_) => ErrorCategory::InvalidInput,
            PipelineError::Io(_) => ErrorCategory::Io,
            PipelineError::StageFailed { .. } | PipelineError::Other(_) => {
                ErrorCategory::WiringDefect
            }
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Backend(BackendError::Request(err))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn wrapped(inner: PipelineError) -> PipelineError {
        PipelineError::StageFailed {
            stage: StageId::Analyze,
            phase: Phase::Execute,
            source: Box::new(inner),
        }
    }

    #[test]
    fn test_root_unwraps_stage_failure() {
        let err = wrapped(PipelineError::NotConfigured);
        assert!(matches!(err.root(), PipelineError::NotConfigured));
        assert_eq!(err.location(), Some((StageId::Analyze, Phase::Execute)));
    }

    #[test]
    fn test_categories_distinguish_operator_actions() {
        assert_eq!(
            wrapped(PipelineError::NotConfigured).category(),
            ErrorCategory::NotConfigured
        );
        assert_eq!(
            wrapped(PipelineError::Backend(BackendError::EmptyResponse)).category(),
            ErrorCategory::BackendFailure
        );
        assert_eq!(
            wrapped(PipelineError::MissingContextKey(ContextKey::Analysis)).category(),
            ErrorCategory::WiringDefect
        );
        assert_eq!(
            PipelineError::InvalidPrompt("empty".into()).category(),
            ErrorCategory::InvalidInput
        );
    }

    #[test]
    fn test_display_names_stage_and_phase() {
        let err = wrapped(PipelineError::MissingContextKey(ContextKey::UserInput));
        let msg = err.to_string();
        assert!(msg.contains("analyze"));
        assert!(msg.contains("execute"));
        assert!(msg.contains("user_input"));
    }

    #[test]
    fn test_http_error_display() {
        let err = PipelineError::from(BackendError::Http {
            status: 503,
            body: "unavailable".into(),
        });
        assert_eq!(
            err.to_string(),
            "completion backend call failed: HTTP 503: unavailable"
        );
    }
}
