//! Engine-internal events and their same-tick priorities.

use rcs_core::{ActivityId, ElementId, ResourceId, WorkItemId};
use serde::{Deserialize, Serialize};

/// Availability removal runs first so nothing is caught on a role that is
/// ending at this very tick.
pub(crate) const PRIO_LOSS: u8 = 0;
/// Finishing activities free their resources before anything new starts.
pub(crate) const PRIO_FINISH: u8 = 1;
pub(crate) const PRIO_GAIN: u8 = 2;
pub(crate) const PRIO_REQUEST: u8 = 3;

/// An entry in a scheduling group's event queue.
///
/// `entry` indexes the resource's timetable (role events) or cancellation
/// list (cancel events).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    RoleOn { resource: ResourceId, entry: usize },
    RoleOff { resource: ResourceId, entry: usize },
    CancelOn { resource: ResourceId, entry: usize },
    CancelOff { resource: ResourceId, entry: usize },
    Finish { item: WorkItemId, generation: u32 },
    Request { item: WorkItemId, element: ElementId, activity: ActivityId },
}

impl EngineEvent {
    pub(crate) fn priority(&self) -> u8 {
        match self {
            EngineEvent::RoleOff { .. } | EngineEvent::CancelOn { .. } => PRIO_LOSS,
            EngineEvent::Finish { .. } => PRIO_FINISH,
            EngineEvent::RoleOn { .. } | EngineEvent::CancelOff { .. } => PRIO_GAIN,
            EngineEvent::Request { .. } => PRIO_REQUEST,
        }
    }
}
