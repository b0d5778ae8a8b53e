//! Observer trait and the typed event stream it receives.

use rcs_core::{ActivityId, ElementId, ResourceId, ResourceTypeId, Tick, WorkGroupId, WorkItemId};
use serde::{Deserialize, Serialize};

/// Everything an observer can see, in emission order.
///
/// Events carrying the same tick are emitted in the order the engine
/// applied them; ticks never decrease along the stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    SimStart { tick: Tick },
    SimEnd { tick: Tick },

    RoleOn { tick: Tick, resource: ResourceId, role: ResourceTypeId, until: Tick },
    RoleOff { tick: Tick, resource: ResourceId, role: ResourceTypeId },
    CancelOn { tick: Tick, resource: ResourceId, until: Tick },
    CancelOff { tick: Tick, resource: ResourceId },

    ResourceCaught { tick: Tick, resource: ResourceId, role: ResourceTypeId, item: WorkItemId },
    ResourceReleased { tick: Tick, resource: ResourceId, item: WorkItemId },
    /// The holder's role expired while the resource was held by a
    /// non-interruptible activity.
    ResourceTimedOut { tick: Tick, resource: ResourceId, item: WorkItemId },
    ResourceEnded { tick: Tick, resource: ResourceId },

    ActivityRequested { tick: Tick, item: WorkItemId, element: ElementId, activity: ActivityId },
    ActivityStarted {
        tick:       Tick,
        item:       WorkItemId,
        element:    ElementId,
        activity:   ActivityId,
        work_group: WorkGroupId,
        duration:   u64,
    },
    ActivityInterrupted {
        tick:      Tick,
        item:      WorkItemId,
        element:   ElementId,
        activity:  ActivityId,
        time_left: u64,
    },
    ActivityFinished { tick: Tick, item: WorkItemId, element: ElementId, activity: ActivityId },
    RequestCancelled { tick: Tick, item: WorkItemId },
}

impl SimEvent {
    pub fn tick(&self) -> Tick {
        match *self {
            SimEvent::SimStart { tick }
            | SimEvent::SimEnd { tick }
            | SimEvent::RoleOn { tick, .. }
            | SimEvent::RoleOff { tick, .. }
            | SimEvent::CancelOn { tick, .. }
            | SimEvent::CancelOff { tick, .. }
            | SimEvent::ResourceCaught { tick, .. }
            | SimEvent::ResourceReleased { tick, .. }
            | SimEvent::ResourceTimedOut { tick, .. }
            | SimEvent::ResourceEnded { tick, .. }
            | SimEvent::ActivityRequested { tick, .. }
            | SimEvent::ActivityStarted { tick, .. }
            | SimEvent::ActivityInterrupted { tick, .. }
            | SimEvent::ActivityFinished { tick, .. }
            | SimEvent::RequestCancelled { tick, .. } => tick,
        }
    }
}

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] and
/// [`Sim::step`][crate::Sim::step].
///
/// Observers are read-only: they cannot influence the run.
///
/// # Example — activity counter
///
/// ```rust,ignore
/// struct Started(usize);
///
/// impl SimObserver for Started {
///     fn on_event(&mut self, event: &SimEvent) {
///         if matches!(event, SimEvent::ActivityStarted { .. }) {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    fn on_event(&mut self, _event: &SimEvent) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Collects the whole event stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    pub events: Vec<SimEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events matching `pred`.
    pub fn count(&self, pred: impl Fn(&SimEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn ticks(&self) -> impl Iterator<Item = Tick> + '_ {
        self.events.iter().map(SimEvent::tick)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl SimObserver for EventLog {
    fn on_event(&mut self, event: &SimEvent) {
        self.events.push(event.clone());
    }
}
