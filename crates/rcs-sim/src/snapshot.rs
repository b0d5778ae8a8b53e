//! `SimSnapshot` — the full dynamic state of a run at a tick boundary.
//!
//! A snapshot holds no model data (types, timetables, activities).  It is
//! resumed with [`SimBuilder::resume_from`][crate::SimBuilder::resume_from]
//! against the same model and strategy it was taken from.  Random streams
//! are reseeded on resume, so a resumed run is reproducible but does not
//! replay the draws the original run would have made.

use std::collections::BTreeMap;

use rcs_activity::WorkItem;
use rcs_core::{ActivityId, ResourceId, ResourceTypeId, SimRng, Tick, WorkItemId};
use rcs_resource::{ResourceState, ResourceStore, Roster};
use rcs_schedule::{CycleIterator, CyclePosition};
use serde::{Deserialize, Serialize};

use crate::event::EngineEvent;
use crate::group::Group;
use crate::{SimError, SimResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub tick:      Tick,
    pub next_item: u64,
    /// Dynamic state of every resource, by `ResourceId`.
    pub resources: Vec<ResourceState>,
    pub groups:    Vec<GroupSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub types:         Vec<ResourceTypeId>,
    /// Pending events in firing order.
    pub pending:       Vec<(Tick, EngineEvent)>,
    pub timetables:    Vec<IteratorPosition>,
    pub cancellations: Vec<IteratorPosition>,
    pub rosters:       Vec<(ResourceTypeId, Roster)>,
    pub items:         Vec<WorkItem>,
    pub waiting:       Vec<(ActivityId, Vec<WorkItemId>)>,
}

/// Where one timetable or cancellation iterator stands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IteratorPosition {
    pub resource: ResourceId,
    pub entry:    usize,
    pub position: CyclePosition,
}

impl Group {
    pub(crate) fn snapshot(&self) -> GroupSnapshot {
        let positions = |iters: &BTreeMap<(ResourceId, usize), CycleIterator>| -> Vec<IteratorPosition> {
            iters
                .iter()
                .map(|(&(resource, entry), it)| IteratorPosition { resource, entry, position: it.position() })
                .collect()
        };
        let mut rosters: Vec<(ResourceTypeId, Roster)> =
            self.rosters.iter().map(|(&t, r)| (t, r.clone())).collect();
        rosters.sort_unstable_by_key(|(t, _)| *t);

        GroupSnapshot {
            types:         self.types.clone(),
            pending:       self.queue.iter().map(|(k, e)| (k.tick, e.clone())).collect(),
            timetables:    positions(&self.timetables),
            cancellations: positions(&self.cancellations),
            rosters,
            items:         self.items.values().cloned().collect(),
            waiting:       self
                .activity_order
                .iter()
                .filter_map(|a| self.waiting.get(a).map(|line| (*a, line.iter().copied().collect())))
                .collect(),
        }
    }

    /// Load `snap` into a freshly built group whose queue starts at the
    /// snapshot tick.
    pub(crate) fn restore(&mut self, snap: &GroupSnapshot, store: &ResourceStore, seed: u64) -> SimResult<()> {
        if snap.types != self.types {
            return Err(SimError::Snapshot(format!("group {} owns different resource types", self.id)));
        }
        for (tick, event) in &snap.pending {
            self.queue.push(*tick, event.priority(), event.clone())?;
        }
        for pos in &snap.timetables {
            let entry = store
                .resource(pos.resource)?
                .timetable
                .get(pos.entry)
                .ok_or_else(|| SimError::Snapshot(format!("{} has no timetable entry {}", pos.resource, pos.entry)))?;
            let rng = SimRng::for_stream(seed, stream_id(pos.resource, pos.entry, false));
            self.timetables
                .insert((pos.resource, pos.entry), CycleIterator::restore(&entry.cycle, &pos.position, rng)?);
        }
        for pos in &snap.cancellations {
            let entry = store
                .resource(pos.resource)?
                .cancellations
                .get(pos.entry)
                .ok_or_else(|| SimError::Snapshot(format!("{} has no cancellation entry {}", pos.resource, pos.entry)))?;
            let rng = SimRng::for_stream(seed, stream_id(pos.resource, pos.entry, true));
            self.cancellations
                .insert((pos.resource, pos.entry), CycleIterator::restore(&entry.cycle, &pos.position, rng)?);
        }
        self.rosters = snap.rosters.iter().cloned().collect();
        self.items = snap.items.iter().map(|it| (it.id, it.clone())).collect();
        self.waiting = snap.waiting.iter().map(|(a, line)| (*a, line.iter().copied().collect())).collect();
        self.dirty = true;
        Ok(())
    }
}

/// RNG stream of one timetable (or cancellation) entry.  Group streams use
/// the low numbers, so entry streams live above bit 48.
pub(crate) fn stream_id(resource: ResourceId, entry: usize, cancellation: bool) -> u64 {
    (1 << 48) | ((cancellation as u64) << 47) | ((resource.0 as u64) << 16) | (entry as u64 & 0xFFFF)
}
