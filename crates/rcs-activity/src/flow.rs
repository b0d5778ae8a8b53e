//! The flow-layer API — how process models drive the engine.
//!
//! A flow layer decides *which* activity an element does next; the engine
//! decides *when* it can run.  The engine calls the flow layer at simulation
//! start and whenever a work item finishes, and the flow layer answers with
//! [`FlowIntent`]s.
//!
//! Callbacks run on the engine's driving thread between timestamps, never
//! concurrently with matching, so a flow layer may keep mutable per-element
//! state without synchronisation.

use rcs_core::{ActivityId, ElementId, Tick, WorkItemId};

use crate::{Activity, WorkItem};

/// A request from the flow layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowIntent {
    /// Ask for `activity` on behalf of `element` now.
    Request { element: ElementId, activity: ActivityId },

    /// Ask for `activity` on behalf of `element` at `at`.
    RequestAt { at: Tick, element: ElementId, activity: ActivityId },

    /// Withdraw a still-queued request.
    Cancel(WorkItemId),
}

/// Read-only state handed to every flow callback.
pub struct FlowContext<'a> {
    pub tick:               Tick,
    pub tick_duration_secs: u32,
    pub activities:         &'a [Activity],
}

impl<'a> FlowContext<'a> {
    #[inline]
    pub fn new(tick: Tick, tick_duration_secs: u32, activities: &'a [Activity]) -> Self {
        Self { tick, tick_duration_secs, activities }
    }

    pub fn activity(&self, id: ActivityId) -> Option<&'a Activity> {
        self.activities.get(id.index())
    }
}

/// Pluggable process logic.
///
/// Only [`on_start`][Self::on_start] is required.
pub trait FlowLayer: 'static {
    /// Called once before the first event is processed.
    fn on_start(&mut self, ctx: &FlowContext<'_>) -> Vec<FlowIntent>;

    /// Called after `item` finished and released its resources.
    fn on_finish(&mut self, _item: &WorkItem, _ctx: &FlowContext<'_>) -> Vec<FlowIntent> {
        vec![]
    }

    /// Called when `item` was interrupted and put back in the queue.
    fn on_interrupted(&mut self, _item: &WorkItem, _ctx: &FlowContext<'_>) -> Vec<FlowIntent> {
        vec![]
    }
}

/// A flow layer that never requests anything.  Useful for timetable-only
/// runs and for driving the engine directly through its request API.
pub struct NoopFlow;

impl FlowLayer for NoopFlow {
    #[inline]
    fn on_start(&mut self, _ctx: &FlowContext<'_>) -> Vec<FlowIntent> {
        vec![]
    }
}
