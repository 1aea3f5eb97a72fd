use super::{complete, LlmSettings};
use crate::backend::CompletionClient;
use crate::context::{preview, SharedContext};
use crate::error::Result;
use crate::prompt::decide_prompt;
use crate::stage::{Action, Stage, StageId};
use async_trait::async_trait;
use std::sync::Arc;

/// What the decide stage reads from the context.
#[derive(Debug, Clone, PartialEq)]
pub struct DecideInput {
    pub user_input: String,
    pub analysis: String,
}

/// Asks the model for one concrete action that solves the request.
pub struct DecideStage {
    client: Arc<dyn CompletionClient>,
    settings: LlmSettings,
}

impl DecideStage {
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
impl Stage for DecideStage {
    type Prepared = DecideInput;
    type Output = String;

    fn id(&self) -> StageId {
        StageId::Decide
    }

    fn prepare(&self, ctx: &SharedContext) -> Result<DecideInput> {
        Ok(DecideInput {
            user_input: ctx.require_user_input()?.to_string(),
            analysis: ctx.require_analysis()?.to_string(),
        })
    }

    async fn execute(&self, input: &DecideInput) -> Result<String> {
        let prompt = decide_prompt(&input.user_input, &input.analysis);
        complete(&self.client, &self.settings, &prompt).await
    }

    fn post_process(
        &self,
        ctx: &mut SharedContext,
        _prepared: DecideInput,
        decision: String,
    ) -> Result<Action> {
        ctx.push_history(format!("Decision: {}", preview(&decision)))?;
        ctx.decision = Some(decision);
        Ok(Action::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::stub::{ANALYSIS_RESPONSE, DECISION_RESPONSE};
    use crate::context::ContextKey;
    use crate::error::PipelineError;
    use crate::stages::test_support::stub;

    #[test]
    fn test_prepare_requires_analysis() {
        let stage = DecideStage::new(stub());
        let mut ctx = SharedContext {
            user_input: Some("2+2=?".into()),
            ..Default::default()
        };
        let err = stage.prepare(&ctx).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingContextKey(ContextKey::Analysis)
        ));

        ctx.analysis = Some("arithmetic".into());
        assert_eq!(
            stage.prepare(&ctx).unwrap(),
            DecideInput {
                user_input: "2+2=?".into(),
                analysis: "arithmetic".into(),
            }
        );
    }

    #[test]
    fn test_prepare_requires_user_input_first() {
        let stage = DecideStage::new(stub());
        let err = stage.prepare(&SharedContext::new()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingContextKey(ContextKey::UserInput)
        ));
    }

    #[tokio::test]
    async fn test_execute_returns_decision() {
        let stage = DecideStage::new(stub());
        let input = DecideInput {
            user_input: "2+2=?".into(),
            analysis: ANALYSIS_RESPONSE.into(),
        };
        assert_eq!(stage.execute(&input).await.unwrap(), DECISION_RESPONSE);
    }

    #[test]
    fn test_post_process_appends_one_entry() {
        let stage = DecideStage::new(stub());
        let mut ctx = SharedContext::default();
        ctx.reset_history();
        ctx.push_history("Query: 2+2=?").unwrap();

        let input = DecideInput {
            user_input: "2+2=?".into(),
            analysis: "arithmetic".into(),
        };
        let action = stage
            .post_process(&mut ctx, input, "d".repeat(101))
            .unwrap();

        assert_eq!(action, Action::Default);
        let history = ctx.require_history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1], format!("Decision: {}...", "d".repeat(100)));
        assert_eq!(ctx.decision.as_ref().map(String::len), Some(101));
    }
}
