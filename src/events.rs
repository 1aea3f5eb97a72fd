//! Event hooks for observing a flow run.
//!
//! Provides an optional, non-intrusive way to follow execution: the flow
//! emits an event when a stage starts, when it ends, and when it picks (or
//! fails to find) a successor. Implement [`EventHandler`] for progress
//! display or to record the run in tests.

use crate::stage::{Action, StageId};
use std::sync::Arc;

/// Events emitted during a flow run.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A stage is about to run its prepare phase.
    StageStart { stage: StageId },
    /// A stage has finished all three phases, or failed in one of them.
    StageEnd { stage: StageId, ok: bool },
    /// The flow resolved the action returned by `from`.
    ///
    /// `to: None` means no edge matched and the run terminates.
    Transition {
        from: StageId,
        action: Action,
        to: Option<StageId>,
    },
}

/// Handler for flow lifecycle events.
///
/// # Example
///
/// ```
/// use orai::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         if let Event::StageStart { stage } = event {
///             eprintln!("[start] {}", stage);
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
