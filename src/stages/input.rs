use crate::console::{InputSource, QUERY_PROMPT};
use crate::context::{preview, SharedContext};
use crate::error::Result;
use crate::prompt::validate_prompt;
use crate::stage::{Action, Stage, StageId};
use async_trait::async_trait;
use std::sync::Arc;

/// Acquires the user's query and starts a fresh history log.
pub struct InputStage {
    source: Arc<dyn InputSource>,
}

impl InputStage {
    pub fn new(source: Arc<dyn InputSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Stage for InputStage {
    type Prepared = ();
    type Output = String;

    fn id(&self) -> StageId {
        StageId::Input
    }

    fn prepare(&self, _ctx: &SharedContext) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, _prepared: &()) -> Result<String> {
        let query = self.source.read_query(QUERY_PROMPT).await?;
        validate_prompt(&query)?;
        Ok(query)
    }

    fn post_process(
        &self,
        ctx: &mut SharedContext,
        _prepared: (),
        query: String,
    ) -> Result<Action> {
        ctx.reset_history();
        ctx.push_history(format!("Query: {}", preview(&query)))?;
        ctx.user_input = Some(query);
        Ok(Action::Default)
    }
}
