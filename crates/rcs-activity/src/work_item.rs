//! `WorkItem` — one element's attempt at one activity.
//!
//! Lifecycle:
//!
//! ```text
//! requested ──▶ queued ──▶ (booked) ──▶ caught/started ──▶ finished
//!                  ▲                          │
//!                  └──────── interrupted ◀────┘
//! ```
//!
//! `booked` and `zone` are only used when the item's candidate resources are
//! shared with another scheduling group.

use rcs_core::{ActivityId, ElementId, ResourceId, ResourceTypeId, Tick, WorkGroupId, WorkItemId, ZoneId};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkItem {
    pub id:         WorkItemId,
    pub element:    ElementId,
    pub activity:   ActivityId,
    /// When the element first asked for the activity.  Survives
    /// interruptions.
    pub arrival_ts: Tick,
    /// The work group of the current (or last) solution.
    pub work_group: Option<WorkGroupId>,
    /// Tentative assignment found by the matcher.
    pub solution:   Vec<(ResourceTypeId, ResourceId)>,
    /// Resources actually held.
    pub caught:     Vec<ResourceId>,
    /// Shared resources booked in a conflict zone.
    pub booked:     Vec<ResourceId>,
    pub zone:       Option<ZoneId>,
    pub started_at: Option<Tick>,
    /// Ticks still to run; set when the item starts, reduced when it is
    /// interrupted.
    pub time_left:  Option<u64>,
    /// Bumped on every start so finish events from an interrupted run can be
    /// recognised as stale.
    pub generation: u32,
}

impl WorkItem {
    pub fn new(id: WorkItemId, element: ElementId, activity: ActivityId, arrival_ts: Tick) -> Self {
        Self {
            id,
            element,
            activity,
            arrival_ts,
            work_group: None,
            solution: Vec::new(),
            caught: Vec::new(),
            booked: Vec::new(),
            zone: None,
            started_at: None,
            time_left: None,
            generation: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Record a start at `now` lasting `duration` ticks.  Returns the new
    /// generation.
    pub fn start(&mut self, now: Tick, duration: u64) -> u32 {
        self.started_at = Some(now);
        self.time_left = Some(duration);
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Stop a running item at `now`, keeping the unfinished remainder.
    /// Returns the ticks left.
    pub fn interrupt(&mut self, now: Tick) -> u64 {
        let left = match (self.started_at, self.time_left) {
            (Some(start), Some(total)) => total.saturating_sub(now - start),
            _ => 0,
        };
        self.started_at = None;
        self.time_left = Some(left);
        self.solution.clear();
        self.caught.clear();
        left
    }

    /// Ticks still to run at `now`, if the item has started at least once.
    pub fn remaining_at(&self, now: Tick) -> Option<u64> {
        match (self.started_at, self.time_left) {
            (Some(start), Some(total)) => Some(total.saturating_sub(now - start)),
            (None, left) => left,
            (Some(_), None) => None,
        }
    }
}
