//! Catching and releasing resources under ordered locks.

use std::sync::MutexGuard;

use rcs_core::{ResourceId, ResourceTypeId, Tick, WorkItemId};
use rcs_resource::{ResourceResult, ResourceState, ResourceStore};
use tracing::debug;

/// Result of a catch attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatchOutcome {
    /// Every resource of the solution now has the item as holder.
    Caught,
    /// `resource` was no longer available; nothing was changed.
    Lost { resource: ResourceId },
}

/// Lock the state of every resource in `ids`, ascending and deduplicated.
pub fn lock_in_order<'a>(
    store: &'a ResourceStore,
    ids: impl IntoIterator<Item = ResourceId>,
) -> ResourceResult<Vec<(ResourceId, MutexGuard<'a, ResourceState>)>> {
    let mut order: Vec<ResourceId> = ids.into_iter().collect();
    order.sort_unstable();
    order.dedup();

    let mut guards = Vec::with_capacity(order.len());
    for id in order {
        guards.push((id, store.resource(id)?.lock()));
    }
    Ok(guards)
}

/// Re-validate a solution under its locks.  Returns the first resource
/// that can no longer be caught for its role.
pub fn check_caught_resources(
    guards: &[(ResourceId, MutexGuard<'_, ResourceState>)],
    solution: &[(ResourceTypeId, ResourceId)],
    now: Tick,
) -> Result<(), ResourceId> {
    for &(role, resource) in solution {
        let ok = guards
            .binary_search_by_key(&resource, |(id, _)| *id)
            .is_ok_and(|i| guards[i].1.is_available(role, now));
        if !ok {
            return Err(resource);
        }
    }
    Ok(())
}

/// Catch every resource of `solution` for `item`.
///
/// `zone_order` is the semaphore order of the item's conflict zone (empty
/// when nothing is shared).  The locks held are the union of the zone's
/// resources and the solution's, taken ascending.  Nothing is mutated
/// unless every resource passes [`check_caught_resources`].
pub fn catch(
    store: &ResourceStore,
    item: WorkItemId,
    solution: &[(ResourceTypeId, ResourceId)],
    zone_order: &[ResourceId],
    now: Tick,
) -> ResourceResult<CatchOutcome> {
    let ids = zone_order.iter().copied().chain(solution.iter().map(|&(_, r)| r));
    let mut guards = lock_in_order(store, ids)?;

    if let Err(resource) = check_caught_resources(&guards, solution, now) {
        debug!(%item, %resource, "catch lost race");
        return Ok(CatchOutcome::Lost { resource });
    }
    for &(role, resource) in solution {
        if let Ok(i) = guards.binary_search_by_key(&resource, |(id, _)| *id) {
            guards[i].1.catch(item, role);
        }
    }
    Ok(CatchOutcome::Caught)
}

/// Release every resource in `resources` held by `item`.  Returns those
/// actually released.  One lock at a time.
pub fn release(
    store: &ResourceStore,
    item: WorkItemId,
    resources: &[ResourceId],
) -> ResourceResult<Vec<ResourceId>> {
    let mut out = Vec::with_capacity(resources.len());
    for &id in resources {
        if store.resource(id)?.lock().release(item).is_some() {
            out.push(id);
        }
    }
    Ok(out)
}
