//! The orchestrator: a transition table over stages.
//!
//! A [`Flow`] holds the registered stages, an entry stage, and a map from
//! `(stage, action)` to the next stage. [`Flow::run`] visits stages one at a
//! time; a label with no edge ends the run normally.

use crate::backend::CompletionClient;
use crate::console::{InputSource, OutputSink};
use crate::context::SharedContext;
use crate::error::{PipelineError, Result};
use crate::events::{emit, Event, EventHandler};
use crate::stage::{Action, Node, StageId};
use crate::stages::{ActStage, AnalyzeStage, DecideStage, InputStage, LlmSettings, OutputStage};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Instrument;

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Stages in the order they were visited.
    pub visited: Vec<StageId>,
}

/// A wired set of stages ready to run.
pub struct Flow {
    start: StageId,
    nodes: HashMap<StageId, Box<dyn Node>>,
    edges: HashMap<(StageId, Action), StageId>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("start", &self.start)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges.len())
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

impl Flow {
    /// Create a new builder.
    pub fn builder() -> FlowBuilder {
        FlowBuilder::default()
    }

    /// Linear flow: each node's `Default` edge leads to the next one, the
    /// last node has no edges.
    pub fn chain(nodes: Vec<Box<dyn Node>>) -> Result<Flow> {
        let ids: Vec<StageId> = nodes.iter().map(|n| n.id()).collect();
        let start = *ids.first().ok_or_else(|| {
            PipelineError::InvalidConfig("Flow has no stages".to_string())
        })?;

        let mut builder = Flow::builder().start(start);
        for node in nodes {
            builder = builder.boxed_node(node);
        }
        for pair in ids.windows(2) {
            builder = builder.edge(pair[0], Action::Default, pair[1]);
        }
        builder.build()
    }

    pub fn start(&self) -> StageId {
        self.start
    }

    /// Successor of `from` for `action`, if an edge exists.
    pub fn successor(&self, from: StageId, action: &Action) -> Option<StageId> {
        self.edges.get(&(from, action.clone())).copied()
    }

    /// Attach an event handler after construction.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Run from the start stage until a stage returns a label with no edge.
    ///
    /// The first error aborts the run; `ctx` keeps whatever earlier stages
    /// wrote.
    pub async fn run(&self, ctx: &mut SharedContext) -> Result<RunReport> {
        let mut visited = Vec::new();
        let mut current = Some(self.start);

        while let Some(id) = current {
            let node = self.nodes.get(&id).ok_or_else(|| {
                PipelineError::InvalidConfig(format!("stage '{}' is not registered", id))
            })?;

            emit(&self.event_handler, Event::StageStart { stage: id });
            visited.push(id);

            let span = tracing::info_span!("stage", stage = %id);
            let result = node.run(ctx).instrument(span).await;
            emit(
                &self.event_handler,
                Event::StageEnd {
                    stage: id,
                    ok: result.is_ok(),
                },
            );
            let action = result?;

            current = self.successor(id, &action);
            match current {
                Some(next) => tracing::debug!(from = %id, %action, to = %next, "transition"),
                None => tracing::info!(from = %id, %action, "no successor, flow finished"),
            }
            emit(
                &self.event_handler,
                Event::Transition {
                    from: id,
                    action,
                    to: current,
                },
            );
        }

        Ok(RunReport { visited })
    }
}

/// Builder for [`Flow`].
#[derive(Default)]
pub struct FlowBuilder {
    start: Option<StageId>,
    nodes: HashMap<StageId, Box<dyn Node>>,
    edges: HashMap<(StageId, Action), StageId>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl FlowBuilder {
    /// Register a stage. A later stage with the same id replaces the earlier one.
    pub fn node(self, node: impl Node + 'static) -> Self {
        self.boxed_node(Box::new(node))
    }

    pub fn boxed_node(mut self, node: Box<dyn Node>) -> Self {
        self.nodes.insert(node.id(), node);
        self
    }

    /// Route `action` returned by `from` to `to`.
    pub fn edge(mut self, from: StageId, action: Action, to: StageId) -> Self {
        self.edges.insert((from, action), to);
        self
    }

    /// Set the entry stage.
    pub fn start(mut self, id: StageId) -> Self {
        self.start = Some(id);
        self
    }

    /// Set the event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Validate the wiring and build the flow.
    pub fn build(self) -> Result<Flow> {
        let start = self.start.ok_or_else(|| {
            PipelineError::InvalidConfig("Flow has no start stage".to_string())
        })?;
        if !self.nodes.contains_key(&start) {
            return Err(PipelineError::InvalidConfig(format!(
                "start stage '{}' is not registered",
                start
            )));
        }
        for ((from, action), to) in &self.edges {
            for id in [from, to] {
                if !self.nodes.contains_key(id) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "edge {} --{}--> {} references unregistered stage '{}'",
                        from, action, to, id
                    )));
                }
            }
        }
        Ok(Flow {
            start,
            nodes: self.nodes,
            edges: self.edges,
            event_handler: self.event_handler,
        })
    }
}

/// The standard agent flow: Input → Analyze → Decide → Act → Output.
pub fn agent_flow(
    client: Arc<dyn CompletionClient>,
    input: Arc<dyn InputSource>,
    output: Arc<dyn OutputSink>,
    settings: LlmSettings,
) -> Result<Flow> {
    let analyze = AnalyzeStage::new(client.clone()).with_settings(settings.clone());
    let decide = DecideStage::new(client.clone()).with_settings(settings.clone());
    let act = ActStage::new(client).with_settings(settings);
    Flow::chain(vec![
        Box::new(InputStage::new(input)) as Box<dyn Node>,
        Box::new(analyze) as Box<dyn Node>,
        Box::new(decide) as Box<dyn Node>,
        Box::new(act) as Box<dyn Node>,
        Box::new(OutputStage::new(output)) as Box<dyn Node>,
    ])
}

/// Build the standard flow, run it on a fresh context, and return the context.
pub async fn run_agent(
    client: Arc<dyn CompletionClient>,
    input: Arc<dyn InputSource>,
    output: Arc<dyn OutputSink>,
    settings: LlmSettings,
) -> Result<SharedContext> {
    let flow = agent_flow(client.clone(), input, output, settings)?;
    let mut ctx = SharedContext::new();
    let span = tracing::info_span!("agent_run", backend = client.name());
    flow.run(&mut ctx).instrument(span).await?;
    Ok(ctx)
}
