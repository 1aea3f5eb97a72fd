//! # Orai
//!
//! A fixed five-stage agent pipeline that turns one user query into a
//! formatted answer through sequential calls to a text-completion backend.
//!
//! ```text
//! Input ──► Analyze ──► Decide ──► Act ──► Output
//!             │           │         │
//!             └──── CompletionClient::generate() ────┘
//! ```
//!
//! ## Core Concepts
//!
//! - **[`Stage`]**: three-phase unit (`prepare → execute → post_process`)
//!   over the [`SharedContext`]. Five implementations live in [`stages`].
//! - **[`Flow`]**: the orchestrator. Runs the current stage and looks up the
//!   successor for the returned [`Action`]; a missing edge ends the run.
//! - **[`CompletionClient`]**: the backend seam, with a deterministic
//!   [`StubClient`] and an OpenAI-compatible [`LiveClient`].
//! - **[`SharedContext`]**: typed per-run state, including the append-only
//!   history log.
//!
//! ## Quick Start
//!
//! ```no_run
//! use orai::{agent_flow, BackendConfig, BackendMode, SharedContext};
//! use orai::console::{ConsoleOutput, FixedInput};
//! use orai::stages::LlmSettings;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BackendConfig::from_env(BackendMode::Auto).build_client()?;
//!     let flow = agent_flow(
//!         client,
//!         Arc::new(FixedInput::new("2+2=?")),
//!         Arc::new(ConsoleOutput),
//!         LlmSettings::default(),
//!     )?;
//!
//!     let mut ctx = SharedContext::new();
//!     flow.run(&mut ctx).await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod console;
pub mod context;
pub mod error;
pub mod events;
pub mod flow;
pub mod prompt;
pub mod stage;
pub mod stages;

pub use backend::{CompletionClient, LiveClient, StubClient};
pub use config::{BackendConfig, BackendMode};
pub use context::{ContextKey, SharedContext};
pub use error::{BackendError, ErrorCategory, PipelineError, Result};
pub use flow::{agent_flow, run_agent, Flow, FlowBuilder, RunReport};
pub use stage::{Action, Node, Phase, Stage, StageId};
