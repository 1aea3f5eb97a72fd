use crate::console::OutputSink;
use crate::context::SharedContext;
use crate::error::Result;
use crate::stage::{Action, Stage, StageId};
use async_trait::async_trait;
use std::sync::Arc;

/// Width of the `=` rules framing the report.
pub const RULE_WIDTH: usize = 60;

const REPORT_TITLE: &str = "ORAI AGENT SYSTEM RESULT";

/// What the output stage reads from the context.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputInput {
    pub user_input: String,
    pub action_result: String,
    pub history: Vec<String>,
}

/// Build the bordered report shown to the operator.
pub fn format_report(input: &OutputInput) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let history = input
        .history
        .iter()
        .map(|entry| format!("- {}", entry))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\n{rule}\n{title}\n{rule}\n\nYour request:\n{query}\n\nResult:\n{result}\n\n{rule}\nProcessing history:\n{history}\n{rule}\n",
        rule = rule,
        title = REPORT_TITLE,
        query = input.user_input,
        result = input.action_result,
        history = history,
    )
}

/// Formats the final report and hands it to the output collaborator.
pub struct OutputStage {
    sink: Arc<dyn OutputSink>,
}

impl OutputStage {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Stage for OutputStage {
    type Prepared = OutputInput;
    type Output = String;

    fn id(&self) -> StageId {
        StageId::Output
    }

    fn prepare(&self, ctx: &SharedContext) -> Result<OutputInput> {
        Ok(OutputInput {
            user_input: ctx.require_user_input()?.to_string(),
            action_result: ctx.require_action_result()?.to_string(),
            history: ctx.require_history()?.to_vec(),
        })
    }

    async fn execute(&self, input: &OutputInput) -> Result<String> {
        Ok(format_report(input))
    }

    fn post_process(
        &self,
        ctx: &mut SharedContext,
        _prepared: OutputInput,
        report: String,
    ) -> Result<Action> {
        self.sink.emit(&report)?;
        ctx.final_output = Some(report);
        Ok(Action::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::CapturedOutput;
    use crate::context::ContextKey;
    use crate::error::PipelineError;

    fn sample() -> OutputInput {
        OutputInput {
            user_input: "2+2=?".into(),
            action_result: "4".into(),
            history: vec!["Query: 2+2=?".into(), "Action: 4".into()],
        }
    }

    #[test]
    fn test_report_layout() {
        let report = format_report(&sample());
        let rule = "=".repeat(RULE_WIDTH);
        let expected = format!(
            "\n{rule}\nORAI AGENT SYSTEM RESULT\n{rule}\n\nYour request:\n2+2=?\n\nResult:\n4\n\n{rule}\nProcessing history:\n- Query: 2+2=?\n- Action: 4\n{rule}\n"
        );
        assert_eq!(report, expected);
    }

    #[test]
    fn test_prepare_requires_action_result() {
        let stage = OutputStage::new(Arc::new(CapturedOutput::new()));
        let mut ctx = SharedContext {
            user_input: Some("2+2=?".into()),
            ..Default::default()
        };
        let err = stage.prepare(&ctx).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingContextKey(ContextKey::ActionResult)
        ));

        ctx.action_result = Some("4".into());
        let err = stage.prepare(&ctx).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingContextKey(ContextKey::History)
        ));

        ctx.history = Some(vec!["Query: 2+2=?".into()]);
        assert_eq!(stage.prepare(&ctx).unwrap().history.len(), 1);
    }

    #[tokio::test]
    async fn test_post_process_emits_and_stores() {
        let sink = Arc::new(CapturedOutput::new());
        let stage = OutputStage::new(sink.clone());
        let mut ctx = SharedContext {
            history: Some(vec!["Query: 2+2=?".into()]),
            ..Default::default()
        };

        let input = sample();
        let report = stage.execute(&input).await.unwrap();
        stage.post_process(&mut ctx, input, report.clone()).unwrap();

        assert_eq!(ctx.final_output.as_deref(), Some(report.as_str()));
        assert_eq!(sink.reports(), vec![report]);
        // Output does not add to the history log.
        assert_eq!(ctx.history_len(), 1);
    }
}
