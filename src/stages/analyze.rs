use super::{complete, LlmSettings};
use crate::backend::CompletionClient;
use crate::context::{preview, SharedContext};
use crate::error::Result;
use crate::prompt::analyze_prompt;
use crate::stage::{Action, Stage, StageId};
use async_trait::async_trait;
use std::sync::Arc;

/// Asks the model to classify the request: task type, key elements, approach.
pub struct AnalyzeStage {
    client: Arc<dyn CompletionClient>,
    settings: LlmSettings,
}

impl AnalyzeStage {
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
impl Stage for AnalyzeStage {
    type Prepared = String;
    type Output = String;

    fn id(&self) -> StageId {
        StageId::Analyze
    }

    fn prepare(&self, ctx: &SharedContext) -> Result<String> {
        Ok(ctx.require_user_input()?.to_string())
    }

    async fn execute(&self, user_input: &String) -> Result<String> {
        complete(&self.client, &self.settings, &analyze_prompt(user_input)).await
    }

    fn post_process(
        &self,
        ctx: &mut SharedContext,
        _prepared: String,
        analysis: String,
    ) -> Result<Action> {
        ctx.push_history(format!("Analysis: {}", preview(&analysis)))?;
        ctx.analysis = Some(analysis);
        Ok(Action::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::stub::ANALYSIS_RESPONSE;
    use crate::backend::LiveClient;
    use crate::context::ContextKey;
    use crate::error::PipelineError;
    use crate::stages::test_support::stub;

    #[test]
    fn test_prepare_requires_user_input() {
        let stage = AnalyzeStage::new(stub());
        let err = stage.prepare(&SharedContext::new()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingContextKey(ContextKey::UserInput)
        ));

        let ctx = SharedContext {
            user_input: Some("2+2=?".into()),
            ..Default::default()
        };
        assert_eq!(stage.prepare(&ctx).unwrap(), "2+2=?");
    }

    #[tokio::test]
    async fn test_execute_uses_analysis_prompt() {
        let stage = AnalyzeStage::new(stub());
        let out = stage.execute(&"2+2=?".to_string()).await.unwrap();
        assert_eq!(out, ANALYSIS_RESPONSE);
    }

    #[tokio::test]
    async fn test_execute_not_configured() {
        let live = LiveClient::builder("http://127.0.0.1:9").build().unwrap();
        let stage = AnalyzeStage::new(Arc::new(live));
        let err = stage.execute(&"2+2=?".to_string()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotConfigured));
    }

    #[test]
    fn test_post_process_appends_preview() {
        let stage = AnalyzeStage::new(stub());
        let mut ctx = SharedContext::default();
        ctx.reset_history();

        let long = "a".repeat(180);
        stage.post_process(&mut ctx, String::new(), long.clone()).unwrap();

        let history = ctx.require_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], format!("Analysis: {}...", "a".repeat(100)));
        assert_eq!(ctx.analysis.as_deref(), Some(long.as_str()));
    }

    #[test]
    fn test_post_process_short_result_unmodified() {
        let stage = AnalyzeStage::new(stub());
        let mut ctx = SharedContext::default();
        ctx.reset_history();
        stage
            .post_process(&mut ctx, String::new(), "short".into())
            .unwrap();
        assert_eq!(ctx.require_history().unwrap(), ["Analysis: short"]);
    }
}
