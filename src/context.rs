//! Shared state threaded through every stage of a run.
//!
//! [`SharedContext`] is a typed record rather than an open map: each key the
//! pipeline knows about is an `Option` field, and the `require_*` accessors
//! turn an unset field into [`PipelineError::MissingContextKey`].

use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::fmt;

/// Number of characters kept by [`preview`] before the ellipsis.
pub const PREVIEW_CHARS: usize = 100;

/// Marker appended to a truncated preview.
pub const ELLIPSIS: &str = "...";

/// The keys a run reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    UserInput,
    History,
    Analysis,
    Decision,
    ActionResult,
    FinalOutput,
}

impl ContextKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKey::UserInput => "user_input",
            ContextKey::History => "history",
            ContextKey::Analysis => "analysis",
            ContextKey::Decision => "decision",
            ContextKey::ActionResult => "action_result",
            ContextKey::FinalOutput => "final_output",
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable state for one pipeline run.
///
/// Created empty, filled in by each stage's post-process phase, and handed
/// back to the caller when the run ends.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SharedContext {
    pub user_input: Option<String>,
    pub history: Option<Vec<String>>,
    pub analysis: Option<String>,
    pub decision: Option<String>,
    pub action_result: Option<String>,
    pub final_output: Option<String>,
}

fn require<'a, T: ?Sized>(value: Option<&'a T>, key: ContextKey) -> Result<&'a T> {
    value.ok_or(PipelineError::MissingContextKey(key))
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_user_input(&self) -> Result<&str> {
        require(self.user_input.as_deref(), ContextKey::UserInput)
    }

    pub fn require_history(&self) -> Result<&[String]> {
        require(self.history.as_deref(), ContextKey::History)
    }

    pub fn require_analysis(&self) -> Result<&str> {
        require(self.analysis.as_deref(), ContextKey::Analysis)
    }

    pub fn require_decision(&self) -> Result<&str> {
        require(self.decision.as_deref(), ContextKey::Decision)
    }

    pub fn require_action_result(&self) -> Result<&str> {
        require(self.action_result.as_deref(), ContextKey::ActionResult)
    }

    /// Start a fresh history log, discarding any previous one.
    pub fn reset_history(&mut self) {
        self.history = Some(Vec::new());
    }

    /// Append one entry to the history log.
    ///
    /// The log must already exist; only the input stage creates it.
    pub fn push_history(&mut self, entry: impl Into<String>) -> Result<()> {
        self.history
            .as_mut()
            .ok_or(PipelineError::MissingContextKey(ContextKey::History))?
            .push(entry.into());
        Ok(())
    }

    /// Number of history entries, zero when the log was never created.
    pub fn history_len(&self) -> usize {
        self.history.as_ref().map_or(0, Vec::len)
    }
}

/// First [`PREVIEW_CHARS`] characters of `text`, with [`ELLIPSIS`] appended
/// only when something was cut.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}
