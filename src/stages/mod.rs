//! The five concrete stages of the agent flow.
//!
//! | Stage | reads | writes |
//! |---|---|---|
//! | [`InputStage`] | - | `user_input`, fresh `history` |
//! | [`AnalyzeStage`] | `user_input` | `analysis` |
//! | [`DecideStage`] | `user_input`, `analysis` | `decision` |
//! | [`ActStage`] | `user_input`, `analysis`, `decision` | `action_result` |
//! | [`OutputStage`] | `user_input`, `action_result`, `history` | `final_output` |

mod act;
mod analyze;
mod decide;
mod input;
mod output;

pub use act::{ActInput, ActStage};
pub use analyze::AnalyzeStage;
pub use decide::{DecideInput, DecideStage};
pub use input::InputStage;
pub use output::{format_report, OutputInput, OutputStage, RULE_WIDTH};

use crate::backend::{CompletionClient, DEFAULT_TEMPERATURE};
use crate::error::Result;
use crate::prompt::validate_prompt;
use std::sync::Arc;

/// Per-call parameters shared by the LLM-backed stages.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// `None` uses the client's default model.
    pub model: Option<String>,
    pub temperature: f64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl LlmSettings {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }
}

/// Validate `prompt` and send it: the one completion call an LLM stage makes.
pub(crate) async fn complete(
    client: &Arc<dyn CompletionClient>,
    settings: &LlmSettings,
    prompt: &str,
) -> Result<String> {
    validate_prompt(prompt)?;
    client
        .generate(prompt, settings.model.as_deref(), settings.temperature)
        .await
}
