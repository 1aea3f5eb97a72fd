//! Completion client trait and its two implementations.
//!
//! The [`CompletionClient`] trait abstracts over text-generation backends.
//! Stages hold an `Arc<dyn CompletionClient>` and never know which variant
//! they are talking to.
//!
//! ## Architecture
//!
//! ```text
//! AnalyzeStage / DecideStage / ActStage
//!                │
//!     CompletionClient::generate()
//!                │
//!      ┌─────────┴─────────┐
//!  StubClient          LiveClient
//!  canned text         {base}/chat/completions
//! ```

pub mod openai;
pub mod stub;

pub use openai::LiveClient;
pub use stub::StubClient;

use crate::error::Result;
use async_trait::async_trait;

/// Model used when neither the caller nor `OPENAI_MODEL` names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature used by the stages unless overridden.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Abstraction over text-generation backends.
///
/// Implementations return the generated text verbatim. They do not validate
/// the prompt (see [`validate_prompt`](crate::prompt::validate_prompt)) and
/// never retry.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn CompletionClient>`.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// `model: None` selects the client's default model.
    async fn generate(&self, prompt: &str, model: Option<&str>, temperature: f64)
        -> Result<String>;

    /// List the model identifiers the backend offers.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Whether calls can succeed at all (a credential is present).
    fn is_configured(&self) -> bool;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}
