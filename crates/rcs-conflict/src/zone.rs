//! Conflict-zone bookkeeping.
//!
//! A conflict zone groups the work items whose bookings overlap on shared
//! resources.  When an item books a resource already booked by an item of
//! another zone, the two zones merge and the lower `ZoneId` survives.
//! Zones never split; a zone disappears when its last item unbooks.
//!
//! The registry holds bookkeeping only.  The per-resource semaphores are
//! the resources' own state mutexes.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rcs_core::{ResourceId, WorkItemId, ZoneId};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{ConflictError, ConflictResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictZone {
    pub id:        ZoneId,
    /// Member items, ascending.
    pub items:     BTreeSet<WorkItemId>,
    /// Every resource booked by a member, ascending.  This is the zone's
    /// semaphore order.
    pub resources: BTreeSet<ResourceId>,
}

#[derive(Debug, Default)]
struct Registry {
    next_zone: u64,
    zones:     FxHashMap<ZoneId, ConflictZone>,
    item_zone: FxHashMap<WorkItemId, ZoneId>,
    item_res:  FxHashMap<WorkItemId, Vec<ResourceId>>,
    bookings:  FxHashMap<ResourceId, Vec<WorkItemId>>,
}

impl Registry {
    fn new_zone(&mut self, item: WorkItemId) -> ZoneId {
        let id = ZoneId(self.next_zone);
        self.next_zone += 1;
        self.zones.insert(
            id,
            ConflictZone { id, items: BTreeSet::from([item]), resources: BTreeSet::new() },
        );
        self.item_zone.insert(item, id);
        id
    }

    /// Fold the higher of `a`, `b` into the lower and return the survivor.
    fn merge(&mut self, a: ZoneId, b: ZoneId) -> ZoneId {
        if a == b {
            return a;
        }
        let (keep, gone) = if a < b { (a, b) } else { (b, a) };
        let Some(absorbed) = self.zones.remove(&gone) else {
            return keep;
        };
        for item in &absorbed.items {
            self.item_zone.insert(*item, keep);
        }
        if let Some(z) = self.zones.get_mut(&keep) {
            z.items.extend(absorbed.items);
            z.resources.extend(absorbed.resources);
        }
        debug!(%keep, %gone, "conflict zones merged");
        keep
    }
}

/// Thread-safe registry of conflict zones.
#[derive(Debug, Default)]
pub struct ConflictZones {
    inner: Mutex<Registry>,
}

impl ConflictZones {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Book `resources` for `item` and return the item's zone after any
    /// merges.  Booking the same resource twice is a no-op.
    pub fn book(&self, item: WorkItemId, resources: &[ResourceId]) -> ZoneId {
        let mut reg = self.lock();
        let mut zone = match reg.item_zone.get(&item) {
            Some(&z) => z,
            None => reg.new_zone(item),
        };

        for &r in resources {
            let mut others: Vec<WorkItemId> = Vec::new();
            {
                let holders = reg.bookings.entry(r).or_default();
                if holders.contains(&item) {
                    continue;
                }
                holders.push(item);
                others.extend(holders.iter().copied().filter(|&o| o != item));
            }
            reg.item_res.entry(item).or_default().push(r);

            for other in others {
                if let Some(&oz) = reg.item_zone.get(&other) {
                    zone = reg.merge(zone, oz);
                }
            }
            if let Some(z) = reg.zones.get_mut(&zone) {
                z.resources.insert(r);
            }
        }
        zone
    }

    /// Drop every booking of `item`.  Returns the zone it belonged to, or
    /// `None` if it had none.  The zone is discarded when it becomes empty.
    pub fn unbook(&self, item: WorkItemId) -> Option<ZoneId> {
        let mut reg = self.lock();
        let zone = reg.item_zone.remove(&item)?;
        for r in reg.item_res.remove(&item).unwrap_or_default() {
            if let Some(holders) = reg.bookings.get_mut(&r) {
                holders.retain(|&i| i != item);
                if holders.is_empty() {
                    reg.bookings.remove(&r);
                }
            }
        }

        let remaining: Option<BTreeSet<WorkItemId>> = reg.zones.get_mut(&zone).map(|z| {
            z.items.remove(&item);
            z.items.clone()
        });
        match remaining {
            Some(items) if items.is_empty() => {
                reg.zones.remove(&zone);
                debug!(%zone, "conflict zone discarded");
            }
            Some(items) => {
                let resources: BTreeSet<ResourceId> = items
                    .iter()
                    .filter_map(|i| reg.item_res.get(i))
                    .flatten()
                    .copied()
                    .collect();
                if let Some(z) = reg.zones.get_mut(&zone) {
                    z.resources = resources;
                }
            }
            None => {}
        }
        Some(zone)
    }

    pub fn zone_of(&self, item: WorkItemId) -> Option<ZoneId> {
        self.lock().item_zone.get(&item).copied()
    }

    pub fn zone(&self, id: ZoneId) -> Option<ConflictZone> {
        self.lock().zones.get(&id).cloned()
    }

    /// The resources whose semaphores a catch by `item` must hold, in
    /// acquisition order.
    pub fn semaphore_order(&self, item: WorkItemId) -> ConflictResult<Vec<ResourceId>> {
        let reg = self.lock();
        let zone = reg.item_zone.get(&item).ok_or(ConflictError::NotBooked(item))?;
        Ok(reg.zones.get(zone).map(|z| z.resources.iter().copied().collect()).unwrap_or_default())
    }

    /// Items currently booking `resource`.
    pub fn bookers(&self, resource: ResourceId) -> Vec<WorkItemId> {
        self.lock().bookings.get(&resource).cloned().unwrap_or_default()
    }

    /// Number of live zones.
    pub fn len(&self) -> usize {
        self.lock().zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().zones.is_empty()
    }
}
