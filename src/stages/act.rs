use super::{complete, LlmSettings};
use crate::backend::CompletionClient;
use crate::context::{preview, SharedContext};
use crate::error::Result;
use crate::prompt::act_prompt;
use crate::stage::{Action, Stage, StageId};
use async_trait::async_trait;
use std::sync::Arc;

/// What the act stage reads from the context.
#[derive(Debug, Clone, PartialEq)]
pub struct ActInput {
    pub user_input: String,
    pub analysis: String,
    pub decision: String,
}

/// Asks the model to carry out the chosen action and report in detail.
pub struct ActStage {
    client: Arc<dyn CompletionClient>,
    settings: LlmSettings,
}

impl ActStage {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            settings: LlmSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: LlmSettings) -> Self {
        self.settings = settings;
        self
    }
}

#[async_trait]
impl Stage for ActStage {
    type Prepared = ActInput;
    type Output = String;

    fn id(&self) -> StageId {
        StageId::Act
    }

    fn prepare(&self, ctx: &SharedContext) -> Result<ActInput> {
        Ok(ActInput {
            user_input: ctx.require_user_input()?.to_string(),
            analysis: ctx.require_analysis()?.to_string(),
            decision: ctx.require_decision()?.to_string(),
        })
    }

    async fn execute(&self, input: &ActInput) -> Result<String> {
        let prompt = act_prompt(&input.user_input, &input.analysis, &input.decision);
        complete(&self.client, &self.settings, &prompt).await
    }

    fn post_process(
        &self,
        ctx: &mut SharedContext,
        _prepared: ActInput,
        result: String,
    ) -> Result<Action> {
        ctx.push_history(format!("Action: {}", preview(&result)))?;
        ctx.action_result = Some(result);
        Ok(Action::Default)
    }
}
