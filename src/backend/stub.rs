//! Deterministic backend for running the pipeline without a live LLM.
//!
//! [`StubClient`] waits a fixed delay to imitate network latency and then
//! picks one of four canned responses by looking for keywords in the prompt.
//!
//! # Example
//!
//! ```
//! use orai::backend::StubClient;
//! use std::time::Duration;
//!
//! let stub = StubClient::new().with_delay(Duration::ZERO);
//! ```

use std::time::Duration;

use async_trait::async_trait;

use super::CompletionClient;
use crate::error::Result;

/// Default artificial latency per call.
pub const DEFAULT_STUB_DELAY: Duration = Duration::from_millis(500);

const ANALYSIS_KEYWORDS: &[&str] = &["анализ", "analyze"];
const DECISION_KEYWORDS: &[&str] = &["решени", "decide"];
const ACTION_KEYWORDS: &[&str] = &["выполни", "execute"];

pub const ANALYSIS_RESPONSE: &str = "Task type: question.
Key elements: the user's request and the expected form of the answer.
Recommended approach: answer directly and keep the explanation short.";

pub const DECISION_RESPONSE: &str =
    "Give the user a direct, well-structured answer to the request.";

pub const ACTION_RESPONSE: &str = "The action has been carried out. \
Here is a detailed answer to your request, prepared by the stub backend.";

/// Which canned response a prompt maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedKind {
    Analysis,
    Decision,
    Action,
    Fallback,
}

/// Classify a prompt. Groups are tested in order, so a prompt that mentions
/// analysis always gets the analysis response.
pub fn classify(prompt: &str) -> CannedKind {
    let lower = prompt.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has_any(ANALYSIS_KEYWORDS) {
        CannedKind::Analysis
    } else if has_any(DECISION_KEYWORDS) {
        CannedKind::Decision
    } else if has_any(ACTION_KEYWORDS) {
        CannedKind::Action
    } else {
        CannedKind::Fallback
    }
}

/// A test backend that answers every prompt with canned text.
#[derive(Debug, Clone)]
pub struct StubClient {
    delay: Duration,
}

impl StubClient {
    /// Create a stub with the default artificial delay.
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_STUB_DELAY,
        }
    }

    /// Override the artificial delay (use `Duration::ZERO` in tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The response for `prompt`, without the delay.
    pub fn respond(prompt: &str) -> String {
        match classify(prompt) {
            CannedKind::Analysis => ANALYSIS_RESPONSE.to_string(),
            CannedKind::Decision => DECISION_RESPONSE.to_string(),
            CannedKind::Action => ACTION_RESPONSE.to_string(),
            CannedKind::Fallback => format!(
                "Stub response to a prompt of {} characters.",
                prompt.chars().count()
            ),
        }
    }
}

impl Default for StubClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for StubClient {
    async fn generate(
        &self,
        prompt: &str,
        _model: Option<&str>,
        _temperature: f64,
    ) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let kind = classify(prompt);
        tracing::debug!(?kind, prompt_chars = prompt.chars().count(), "stub completion");
        Ok(Self::respond(prompt))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec!["stub".to_string()])
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
