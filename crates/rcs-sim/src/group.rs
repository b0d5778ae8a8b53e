//! `Group` — one scheduling group: a set of resource types with their own
//! event queue, rosters, waiting lines, and work items.
//!
//! A group only ever mutates its own fields and, through the per-resource
//! mutexes, shared resource state.  Everything else it wants to say to the
//! rest of the engine goes into a [`StepOutput`], which the engine merges in
//! group order after each phase.

use std::collections::{BTreeMap, VecDeque};

use rcs_activity::{find_solution, Activity, ResourceView, Solution, WorkItem};
use rcs_conflict::{catch, release, CatchOutcome, ConflictZones};
use rcs_core::{ActivityId, GroupId, ResourceId, ResourceTypeId, SimRng, Tick, WorkItemId};
use rcs_resource::{ResourceStore, Roster};
use rcs_schedule::{CycleIterator, EventQueue};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::event::{EngineEvent, PRIO_FINISH, PRIO_GAIN, PRIO_LOSS};
use crate::{SimError, SimEvent, SimResult};

/// Read-only model data shared by every group during a phase.
pub(crate) struct Shared<'a> {
    pub store:           &'a ResourceStore,
    pub activities:      &'a [Activity],
    pub zones:           &'a ConflictZones,
    /// Groups owning at least one role of each resource, by `ResourceId`.
    pub resource_groups: &'a [Vec<GroupId>],
}

/// What a group produced during one phase.
#[derive(Default)]
pub(crate) struct StepOutput {
    pub events:      Vec<SimEvent>,
    /// Resources that became (potentially) available.
    pub touched:     Vec<ResourceId>,
    pub finished:    Vec<WorkItem>,
    pub interrupted: Vec<WorkItem>,
}

pub(crate) struct Group {
    pub id:              GroupId,
    pub types:           Vec<ResourceTypeId>,
    pub queue:           EventQueue<EngineEvent>,
    pub rosters:         FxHashMap<ResourceTypeId, Roster>,
    pub timetables:      BTreeMap<(ResourceId, usize), CycleIterator>,
    pub cancellations:   BTreeMap<(ResourceId, usize), CycleIterator>,
    /// Owned activities, highest priority first, then by id.
    pub activity_order:  Vec<ActivityId>,
    pub type_activities: FxHashMap<ResourceTypeId, Vec<ActivityId>>,
    /// FIFO lines of queued items, one per activity.
    pub waiting:         FxHashMap<ActivityId, VecDeque<WorkItemId>>,
    pub items:           BTreeMap<WorkItemId, WorkItem>,
    pub rng:             SimRng,
    /// Waiting items may be matchable; run `settle`.
    pub dirty:           bool,
}

struct GroupView<'a> {
    rosters: &'a FxHashMap<ResourceTypeId, Roster>,
    store:   &'a ResourceStore,
    now:     Tick,
}

impl ResourceView for GroupView<'_> {
    fn candidates(&self, rtype: ResourceTypeId) -> &[ResourceId] {
        self.rosters.get(&rtype).map(Roster::as_slice).unwrap_or(&[])
    }

    fn is_available(&self, resource: ResourceId, rtype: ResourceTypeId) -> bool {
        self.store.resource(resource).is_ok_and(|r| r.is_available(rtype, self.now))
    }
}

impl Group {
    pub fn new(id: GroupId, types: Vec<ResourceTypeId>, start: Tick, rng: SimRng) -> Self {
        Self {
            id,
            types,
            queue: EventQueue::new(start),
            rosters: FxHashMap::default(),
            timetables: BTreeMap::new(),
            cancellations: BTreeMap::new(),
            activity_order: Vec::new(),
            type_activities: FxHashMap::default(),
            waiting: FxHashMap::default(),
            items: BTreeMap::new(),
            rng,
            dirty: false,
        }
    }

    // ── Event phase ───────────────────────────────────────────────────────

    /// Apply every queued event at `tick`, in key order.
    pub fn drain(&mut self, tick: Tick, sh: &Shared<'_>) -> SimResult<StepOutput> {
        trace!(group = %self.id, %tick, "drain");
        let mut out = StepOutput::default();
        while let Some((_, event)) = self.queue.pop_at(tick) {
            match event {
                EngineEvent::RoleOn { resource, entry } => self.role_on(resource, entry, tick, sh, &mut out)?,
                EngineEvent::RoleOff { resource, entry } => self.role_off(resource, entry, tick, sh, &mut out)?,
                EngineEvent::CancelOn { resource, entry } => self.cancel_on(resource, entry, tick, sh, &mut out)?,
                EngineEvent::CancelOff { resource, entry } => {
                    self.cancel_off(resource, entry, tick, sh, &mut out)?
                }
                EngineEvent::Finish { item, generation } => {
                    let live = self
                        .items
                        .get(&item)
                        .is_some_and(|i| i.is_running() && i.generation == generation);
                    if live {
                        self.finish(item, tick, sh, &mut out)?;
                    } else {
                        trace!(%item, generation, "stale finish ignored");
                    }
                }
                EngineEvent::Request { item, element, activity } => {
                    self.enqueue(WorkItem::new(item, element, activity, tick));
                    out.events.push(SimEvent::ActivityRequested { tick, item, element, activity });
                }
            }
        }
        Ok(out)
    }

    fn role_on(
        &mut self,
        resource: ResourceId,
        entry: usize,
        now: Tick,
        sh: &Shared<'_>,
        out: &mut StepOutput,
    ) -> SimResult<()> {
        let res = sh.store.resource(resource)?;
        let Some(tt) = res.timetable.get(entry) else {
            return Err(SimError::Snapshot(format!("{resource} has no timetable entry {entry}")));
        };
        let role = tt.role;
        let hook = &sh.store.resource_type(role)?.hook;

        let delay = hook.before_role_on(resource, role, now);
        if delay > 0 {
            self.queue.push(now + delay, PRIO_GAIN, EngineEvent::RoleOn { resource, entry })?;
            return Ok(());
        }

        let until = now + tt.duration.sample(&mut self.rng);
        res.lock().role_on(role, until);
        self.rosters.entry(role).or_default().insert(resource);
        self.queue.push(until, PRIO_LOSS, EngineEvent::RoleOff { resource, entry })?;
        hook.after_role_on(resource, role, now);

        debug!(%resource, %role, %until, "role on");
        out.events.push(SimEvent::RoleOn { tick: now, resource, role, until });
        out.touched.push(resource);
        Ok(())
    }

    fn role_off(
        &mut self,
        resource: ResourceId,
        entry: usize,
        now: Tick,
        sh: &Shared<'_>,
        out: &mut StepOutput,
    ) -> SimResult<()> {
        let res = sh.store.resource(resource)?;
        let Some(tt) = res.timetable.get(entry) else {
            return Err(SimError::Snapshot(format!("{resource} has no timetable entry {entry}")));
        };
        let role = tt.role;
        let hook = &sh.store.resource_type(role)?.hook;

        let delay = hook.before_role_off(resource, role, now);
        if delay > 0 {
            // The role stays playable until the deferred turn-off.
            res.lock().extend_role(role, now + delay);
            self.queue.push(now + delay, PRIO_LOSS, EngineEvent::RoleOff { resource, entry })?;
            return Ok(());
        }

        let outcome = res.lock().role_off(role);
        if !outcome.still_active {
            if let Some(roster) = self.rosters.get_mut(&role) {
                roster.remove(resource);
            }
        }
        debug!(%resource, %role, "role off");
        out.events.push(SimEvent::RoleOff { tick: now, resource, role });

        // A holder whose finish falls on this tick never held past expiry;
        // its queued finish releases the resource.
        let holder_timed_out = outcome.holder_timed_out.filter(|h| {
            let ends_now = self
                .items
                .get(&h.item)
                .is_some_and(|i| i.is_running() && i.remaining_at(now) == Some(0));
            if ends_now {
                res.lock().timed_out = false;
            }
            !ends_now
        });
        if let Some(holder) = holder_timed_out {
            let interruptible = self
                .items
                .get(&holder.item)
                .is_some_and(|i| sh.activities.get(i.activity.index()).is_some_and(|a| a.interruptible));
            if interruptible {
                self.interrupt(holder.item, now, sh, out)?;
                // Evicted, so any other role it still plays is usable again.
                res.lock().timed_out = false;
            } else {
                warn!(%resource, item = %holder.item, "held resource timed out");
                out.events.push(SimEvent::ResourceTimedOut { tick: now, resource, item: holder.item });
            }
        }
        hook.after_role_off(resource, role, now);

        let next = self.timetables.get_mut(&(resource, entry)).and_then(Iterator::next);
        match next {
            // An occurrence that started while the previous one was still
            // running activates as soon as it can.
            Some(ts) => {
                self.queue.push(ts.max(now), PRIO_GAIN, EngineEvent::RoleOn { resource, entry })?;
            }
            None => {
                if res.lock().entry_exhausted() {
                    debug!(%resource, "resource ended");
                    out.events.push(SimEvent::ResourceEnded { tick: now, resource });
                }
            }
        }
        Ok(())
    }

    fn cancel_on(
        &mut self,
        resource: ResourceId,
        entry: usize,
        now: Tick,
        sh: &Shared<'_>,
        out: &mut StepOutput,
    ) -> SimResult<()> {
        let res = sh.store.resource(resource)?;
        let Some(ce) = res.cancellations.get(entry) else {
            return Err(SimError::Snapshot(format!("{resource} has no cancellation entry {entry}")));
        };
        let until = now + ce.duration.sample(&mut self.rng);
        res.lock().cancel_on();
        self.queue.push(until, PRIO_GAIN, EngineEvent::CancelOff { resource, entry })?;

        debug!(%resource, %until, "cancellation on");
        out.events.push(SimEvent::CancelOn { tick: now, resource, until });
        Ok(())
    }

    fn cancel_off(
        &mut self,
        resource: ResourceId,
        entry: usize,
        now: Tick,
        sh: &Shared<'_>,
        out: &mut StepOutput,
    ) -> SimResult<()> {
        sh.store.resource(resource)?.lock().cancel_off();
        debug!(%resource, "cancellation off");
        out.events.push(SimEvent::CancelOff { tick: now, resource });
        out.touched.push(resource);

        if let Some(ts) = self.cancellations.get_mut(&(resource, entry)).and_then(Iterator::next) {
            self.queue.push(ts.max(now), PRIO_LOSS, EngineEvent::CancelOn { resource, entry })?;
        }
        Ok(())
    }

    // ── Work items ────────────────────────────────────────────────────────

    pub fn enqueue(&mut self, item: WorkItem) {
        self.waiting.entry(item.activity).or_default().push_back(item.id);
        self.items.insert(item.id, item);
        self.dirty = true;
    }

    /// Put an interrupted item back in line by arrival order.
    fn requeue(&mut self, id: WorkItemId, activity: ActivityId) {
        let line = self.waiting.entry(activity).or_default();
        let pos = line.partition_point(|&x| x < id);
        line.insert(pos, id);
        self.dirty = true;
    }

    /// Release everything `id` holds and retire it.
    pub fn finish(&mut self, id: WorkItemId, now: Tick, sh: &Shared<'_>, out: &mut StepOutput) -> SimResult<()> {
        let item = self.items.remove(&id).ok_or(SimError::UnknownItem(id))?;
        let released = release(sh.store, id, &item.caught)?;
        if !item.booked.is_empty() {
            sh.zones.unbook(id);
        }

        for &resource in &released {
            out.events.push(SimEvent::ResourceReleased { tick: now, resource, item: id });
        }
        out.events.push(SimEvent::ActivityFinished {
            tick:     now,
            item:     id,
            element:  item.element,
            activity: item.activity,
        });
        debug!(item = %id, activity = %item.activity, "activity finished");

        out.touched.extend(released);
        out.finished.push(item);
        Ok(())
    }

    fn interrupt(&mut self, id: WorkItemId, now: Tick, sh: &Shared<'_>, out: &mut StepOutput) -> SimResult<()> {
        let Some(item) = self.items.get_mut(&id) else {
            return Ok(());
        };
        let released = release(sh.store, id, &item.caught)?;
        if !item.booked.is_empty() {
            sh.zones.unbook(id);
            item.booked.clear();
            item.zone = None;
        }
        let time_left = item.interrupt(now);

        for &resource in &released {
            out.events.push(SimEvent::ResourceReleased { tick: now, resource, item: id });
        }
        out.events.push(SimEvent::ActivityInterrupted {
            tick: now,
            item: id,
            element: item.element,
            activity: item.activity,
            time_left,
        });
        debug!(item = %id, time_left, "activity interrupted");

        let activity = item.activity;
        out.interrupted.push(item.clone());
        out.touched.extend(released);
        self.requeue(id, activity);
        Ok(())
    }

    /// Withdraw a queued item.  `None` if unknown, `Some(false)` if running.
    pub fn cancel(&mut self, id: WorkItemId) -> Option<bool> {
        let item = self.items.get(&id)?;
        if item.is_running() {
            return Some(false);
        }
        let activity = item.activity;
        if let Some(line) = self.waiting.get_mut(&activity) {
            line.retain(|&x| x != id);
        }
        self.items.remove(&id);
        Some(true)
    }

    /// Drop a scheduled request that has not fired yet.
    pub fn cancel_scheduled(&mut self, id: WorkItemId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|_, e| !matches!(e, EngineEvent::Request { item, .. } if *item == id));
        self.queue.len() < before
    }

    /// Resources playing any of `roles` changed state.
    pub fn notify(&mut self, roles: &[ResourceTypeId], activities: &[Activity]) {
        for role in roles {
            let Some(owned) = self.type_activities.get(role) else {
                continue;
            };
            for a in owned {
                if let Some(activity) = activities.get(a.index()) {
                    activity.reset_feasible();
                }
            }
            self.dirty = true;
        }
    }

    // ── Matching phase ────────────────────────────────────────────────────

    /// Start every waiting item that can start now.
    ///
    /// Activities are visited by priority, items within an activity in
    /// arrival order.  A lost catch leaves the item in place and marks the
    /// group dirty so it is retried against the updated state.
    pub fn settle(&mut self, now: Tick, sh: &Shared<'_>) -> SimResult<StepOutput> {
        self.dirty = false;
        let mut out = StepOutput::default();

        for ai in 0..self.activity_order.len() {
            let aid = self.activity_order[ai];
            let Some(activity) = sh.activities.get(aid.index()) else {
                continue;
            };
            let mut i = 0;
            while let Some(&id) = self.waiting.get(&aid).and_then(|line| line.get(i)) {
                if !activity.is_potentially_feasible() {
                    break;
                }
                let Some(element) = self.items.get(&id).map(|it| it.element) else {
                    i += 1;
                    continue;
                };
                let solution = {
                    let view = GroupView { rosters: &self.rosters, store: sh.store, now };
                    find_solution(activity, element, now, &view)
                };
                let Some(solution) = solution else {
                    i += 1;
                    continue;
                };
                if self.start(id, solution, now, sh, &mut out)? {
                    if let Some(line) = self.waiting.get_mut(&aid) {
                        line.remove(i);
                    }
                } else {
                    i += 1;
                    self.dirty = true;
                }
            }
        }
        Ok(out)
    }

    /// Catch the solution's resources for `id` and schedule its finish.
    /// Returns `false` if the catch lost a race.
    fn start(
        &mut self,
        id: WorkItemId,
        solution: Solution,
        now: Tick,
        sh: &Shared<'_>,
        out: &mut StepOutput,
    ) -> SimResult<bool> {
        let shared: Vec<ResourceId> = solution
            .assignment
            .iter()
            .map(|&(_, r)| r)
            .filter(|r| sh.resource_groups.get(r.index()).is_some_and(|g| g.len() > 1))
            .collect();
        let order = if shared.is_empty() {
            Vec::new()
        } else {
            sh.zones.book(id, &shared);
            sh.zones.semaphore_order(id)?
        };

        if let CatchOutcome::Lost { resource } = catch(sh.store, id, &solution.assignment, &order, now)? {
            if !shared.is_empty() {
                sh.zones.unbook(id);
            }
            debug!(item = %id, %resource, "catch aborted, item stays queued");
            return Ok(false);
        }

        let item = self.items.get_mut(&id).ok_or(SimError::UnknownItem(id))?;
        let activity = sh.activities.get(item.activity.index()).ok_or(SimError::UnknownActivity(item.activity))?;
        let duration = match item.time_left {
            Some(left) => left,
            None => activity
                .work_group(solution.work_group)
                .map_or(0, |wg| wg.duration.sample(&mut self.rng)),
        };

        item.work_group = Some(solution.work_group);
        item.caught = solution.assignment.iter().map(|&(_, r)| r).collect();
        item.zone = if shared.is_empty() { None } else { sh.zones.zone_of(id) };
        item.booked = shared;
        item.solution = solution.assignment;
        let generation = item.start(now, duration);

        for &(role, resource) in &item.solution {
            out.events.push(SimEvent::ResourceCaught { tick: now, resource, role, item: id });
        }
        out.events.push(SimEvent::ActivityStarted {
            tick: now,
            item: id,
            element: item.element,
            activity: item.activity,
            work_group: solution.work_group,
            duration,
        });
        debug!(item = %id, activity = %item.activity, duration, "activity started");

        self.queue.push(now + duration, PRIO_FINISH, EngineEvent::Finish { item: id, generation })?;
        Ok(true)
    }
}
