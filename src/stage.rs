//! The three-phase stage contract and its type-erased form.
//!
//! A [`Stage`] is visited as `prepare → execute → post_process`:
//!
//! - `prepare` reads what it needs from the [`SharedContext`];
//! - `execute` does the work (usually one completion call) without touching
//!   the context;
//! - `post_process` writes results back and returns the [`Action`] that picks
//!   the successor.
//!
//! Stages have typed intermediate values, so the flow stores them behind the
//! object-safe [`Node`] trait, which every `Stage` gets for free.

use crate::context::SharedContext;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// A boxed, pinned, Send future -- the return type of [`Node::run`].
pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Identity of a stage in the agent flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    Input,
    Analyze,
    Decide,
    Act,
    Output,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Input => "input",
            StageId::Analyze => "analyze",
            StageId::Decide => "decide",
            StageId::Act => "act",
            StageId::Output => "output",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the three phases of a stage visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Execute,
    PostProcess,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Prepare => "prepare",
            Phase::Execute => "execute",
            Phase::PostProcess => "post_process",
        })
    }
}

/// Label returned by `post_process` to select the outgoing edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// The chain's configured default successor (`"default"`).
    Default,
    /// A named branch.
    Named(Cow<'static, str>),
}

impl Action {
    pub fn named(label: impl Into<Cow<'static, str>>) -> Self {
        let label = label.into();
        if label == "default" {
            Action::Default
        } else {
            Action::Named(label)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Default => "default",
            Action::Named(label) => label,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of the pipeline.
///
/// `Prepared` is the projection of the context the stage works from, and
/// `Output` is what `execute` produces. Both stay local to a single visit.
#[async_trait]
pub trait Stage: Send + Sync {
    type Prepared: Send + Sync;
    type Output: Send;

    fn id(&self) -> StageId;

    /// Read the keys this stage needs. Must not modify anything.
    fn prepare(&self, ctx: &SharedContext) -> Result<Self::Prepared>;

    /// Do the stage's work.
    async fn execute(&self, prepared: &Self::Prepared) -> Result<Self::Output>;

    /// Write results into the context and choose the successor.
    fn post_process(
        &self,
        ctx: &mut SharedContext,
        prepared: Self::Prepared,
        output: Self::Output,
    ) -> Result<Action>;
}

/// Object-safe view of a [`Stage`], used by the flow.
pub trait Node: Send + Sync {
    fn id(&self) -> StageId;

    /// Run all three phases in order against `ctx`.
    ///
    /// Errors come back wrapped in [`PipelineError::StageFailed`] naming this
    /// stage and the failing phase.
    fn run<'a>(&'a self, ctx: &'a mut SharedContext) -> BoxFut<'a, Result<Action>>;
}

fn at(stage: StageId, phase: Phase) -> impl FnOnce(PipelineError) -> PipelineError {
    move |err| PipelineError::StageFailed {
        stage,
        phase,
        source: Box::new(err),
    }
}

impl<S: Stage> Node for S {
    fn id(&self) -> StageId {
        Stage::id(self)
    }

    fn run<'a>(&'a self, ctx: &'a mut SharedContext) -> BoxFut<'a, Result<Action>> {
        Box::pin(async move {
            let id = Stage::id(self);

            let prepared = self.prepare(ctx).map_err(at(id, Phase::Prepare))?;
            tracing::trace!(stage = %id, "prepared");

            let output = self
                .execute(&prepared)
                .await
                .map_err(at(id, Phase::Execute))?;
            tracing::trace!(stage = %id, "executed");

            let action = self
                .post_process(ctx, prepared, output)
                .map_err(at(id, Phase::PostProcess))?;
            tracing::debug!(stage = %id, %action, "stage finished");
            Ok(action)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextKey;

    /// Copies `analysis` into `decision`; fails in whichever phase is asked.
    struct CopyStage {
        fail_in: Option<Phase>,
    }

    #[async_trait]
    impl Stage for CopyStage {
        type Prepared = String;
        type Output = String;

        fn id(&self) -> StageId {
            StageId::Decide
        }

        fn prepare(&self, ctx: &SharedContext) -> Result<String> {
            if self.fail_in == Some(Phase::Prepare) {
                return Err(PipelineError::Other("prepare".into()));
            }
            Ok(ctx.require_analysis()?.to_string())
        }

        async fn execute(&self, prepared: &String) -> Result<String> {
            if self.fail_in == Some(Phase::Execute) {
                return Err(PipelineError::NotConfigured);
            }
            Ok(prepared.to_uppercase())
        }

        fn post_process(
            &self,
            ctx: &mut SharedContext,
            _prepared: String,
            output: String,
        ) -> Result<Action> {
            if self.fail_in == Some(Phase::PostProcess) {
                return Err(PipelineError::Other("post".into()));
            }
            ctx.decision = Some(output);
            Ok(Action::Default)
        }
    }

    fn ctx_with_analysis() -> SharedContext {
        SharedContext {
            analysis: Some("sum".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_node_runs_all_phases() {
        let stage = CopyStage { fail_in: None };
        let mut ctx = ctx_with_analysis();
        let action = Node::run(&stage, &mut ctx).await.unwrap();
        assert_eq!(action, Action::Default);
        assert_eq!(ctx.decision.as_deref(), Some("SUM"));
    }

    #[tokio::test]
    async fn test_node_reports_failing_phase() {
        for phase in [Phase::Prepare, Phase::Execute, Phase::PostProcess] {
            let stage = CopyStage { fail_in: Some(phase) };
            let mut ctx = ctx_with_analysis();
            let err = Node::run(&stage, &mut ctx).await.unwrap_err();
            assert_eq!(err.location(), Some((StageId::Decide, phase)));
            assert!(ctx.decision.is_none());
        }
    }

    #[tokio::test]
    async fn test_node_missing_key_in_prepare() {
        let stage = CopyStage { fail_in: None };
        let mut ctx = SharedContext::new();
        let err = Node::run(&stage, &mut ctx).await.unwrap_err();
        assert_eq!(err.location(), Some((StageId::Decide, Phase::Prepare)));
        assert!(matches!(
            err.root(),
            PipelineError::MissingContextKey(ContextKey::Analysis)
        ));
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(Action::Default.as_str(), "default");
        assert_eq!(Action::named("default"), Action::Default);
        assert_eq!(Action::named("retry").to_string(), "retry");
    }
}
