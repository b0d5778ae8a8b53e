//! Branch-and-bound matching of work groups against available resources.
//!
//! # Search
//!
//! A work group `[(T0, n0), (T1, n1), …]` is expanded into slots, one per
//! type.  The search walks an explicit stack of frames; each frame owns an
//! immutable copy of the counts still needed, the slot it is filling, and
//! the next candidate position in that slot's pool:
//!
//! ```text
//! pools:  T0 = [r1, r3, r4]   T1 = [r3, r5]      needs: T0×2, T1×1
//!
//! frame { needed [2,1], slot 0, pos 0 }  pick r1
//! frame { needed [1,1], slot 0, pos 1 }  pick r3
//! frame { needed [0,1], slot 1, pos 0 }  r3 taken → pick r5
//! frame { needed [0,0], slot 2 }         complete: T0={r1,r3}, T1={r5}
//! ```
//!
//! Within a slot, positions only increase, so each combination is visited
//! once.  A resource chosen for one slot is skipped in every other slot.
//!
//! # Bound
//!
//! Before expanding a frame, every slot from the current one on must still
//! have at least as many unchosen candidates as it needs; otherwise the
//! frame is popped.
//!
//! # Determinism
//!
//! Pools are taken in roster (`ResourceId`) order and work groups in
//! priority order, so identical inputs always produce the same solution.

use rcs_core::{ElementId, ResourceId, ResourceTypeId, Tick, WorkGroupId};
use tracing::trace;

use crate::{Activity, WorkGroup};

/// Read access to the current resource situation of one scheduling group.
pub trait ResourceView {
    /// Resources currently playing `rtype`, ascending by id.
    fn candidates(&self, rtype: ResourceTypeId) -> &[ResourceId];

    /// Whether `resource` can be caught as `rtype` right now.
    fn is_available(&self, resource: ResourceId, rtype: ResourceTypeId) -> bool;
}

/// `(role, resource)` pairs, grouped by role in ascending type order.
pub type Assignment = Vec<(ResourceTypeId, ResourceId)>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    pub work_group: WorkGroupId,
    pub assignment: Assignment,
}

/// Try each admissible work group of `activity` in priority order.
///
/// When every work group was searched exhaustively without success the
/// activity is flagged infeasible; a work group skipped by its admission
/// condition keeps the activity feasible, since the condition may hold later.
pub fn find_solution<V: ResourceView + ?Sized>(
    activity: &Activity,
    element: ElementId,
    now: Tick,
    view: &V,
) -> Option<Solution> {
    if !activity.is_potentially_feasible() {
        return None;
    }
    let mut skipped = false;
    for wg in activity.work_groups() {
        if !wg.admits(element, now) {
            skipped = true;
            continue;
        }
        if let Some(assignment) = solve_work_group(&wg.work_group, view) {
            trace!(activity = %activity.id, work_group = %wg.id, %element, "match found");
            return Some(Solution { work_group: wg.id, assignment });
        }
    }
    if !skipped {
        activity.mark_infeasible();
    }
    trace!(activity = %activity.id, %element, skipped, "no match");
    None
}

struct Frame {
    needed: Box<[u32]>,
    slot:   usize,
    pos:    usize,
}

/// Find one assignment satisfying `work_group`, or `None`.
pub fn solve_work_group<V: ResourceView + ?Sized>(work_group: &WorkGroup, view: &V) -> Option<Assignment> {
    let needs = work_group.needs();
    if needs.is_empty() {
        return Some(Vec::new());
    }

    let pools: Vec<Vec<ResourceId>> = needs
        .iter()
        .map(|&(rtype, _)| {
            view.candidates(rtype).iter().copied().filter(|&r| view.is_available(r, rtype)).collect()
        })
        .collect();
    if needs.iter().zip(&pools).any(|(&(_, n), pool)| pool.len() < n as usize) {
        return None;
    }

    let mut chosen: Vec<ResourceId> = Vec::with_capacity(work_group.size() as usize);
    let mut stack = vec![Frame {
        needed: needs.iter().map(|&(_, n)| n).collect(),
        slot:   0,
        pos:    0,
    }];

    while let Some(frame) = stack.last_mut() {
        if frame.slot == needs.len() {
            return Some(assemble(needs, &chosen));
        }
        if !bound_holds(frame, &pools, &chosen) {
            stack.pop();
            chosen.pop();
            continue;
        }

        let pool = &pools[frame.slot];
        match (frame.pos..pool.len()).find(|&i| !chosen.contains(&pool[i])) {
            Some(i) => {
                frame.pos = i + 1;
                let mut needed = frame.needed.clone();
                needed[frame.slot] -= 1;
                let (slot, pos) = if needed[frame.slot] > 0 {
                    (frame.slot, i + 1)
                } else {
                    (frame.slot + 1, 0)
                };
                chosen.push(pool[i]);
                stack.push(Frame { needed, slot, pos });
            }
            None => {
                stack.pop();
                chosen.pop();
            }
        }
    }
    None
}

fn bound_holds(frame: &Frame, pools: &[Vec<ResourceId>], chosen: &[ResourceId]) -> bool {
    let free = |rs: &[ResourceId]| rs.iter().filter(|r| !chosen.contains(r)).count();
    let here = &pools[frame.slot][frame.pos.min(pools[frame.slot].len())..];
    if free(here) < frame.needed[frame.slot] as usize {
        return false;
    }
    (frame.slot + 1..pools.len()).all(|s| free(&pools[s]) >= frame.needed[s] as usize)
}

fn assemble(needs: &[(ResourceTypeId, u32)], chosen: &[ResourceId]) -> Assignment {
    let mut out = Vec::with_capacity(chosen.len());
    let mut picks = chosen.iter().copied();
    for &(rtype, n) in needs {
        out.extend(picks.by_ref().take(n as usize).map(|r| (rtype, r)));
    }
    out
}
