//! The `Sim` struct and its event loop.

use rcs_activity::{Activity, FlowContext, FlowIntent, FlowLayer, WorkItem};
use rcs_conflict::ConflictZones;
use rcs_core::{
    ActivityId, ElementId, GroupId, ResourceId, ResourceTypeId, SimClock, SimConfig, SimRng, Tick, WorkItemId,
};
use rcs_resource::ResourceStore;
use tracing::{debug, info};

use crate::event::{EngineEvent, PRIO_GAIN, PRIO_LOSS, PRIO_REQUEST};
use crate::group::{Group, Shared, StepOutput};
use crate::snapshot::{stream_id, SimSnapshot};
use crate::{SimError, SimEvent, SimObserver, SimResult};

/// What [`Sim::request_activity`] did with a request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Resources were caught; the activity is running.
    Admitted(WorkItemId),
    /// No solution right now; the item waits in its activity's queue.
    Queued(WorkItemId),
}

impl RequestOutcome {
    pub fn item(self) -> WorkItemId {
        match self {
            RequestOutcome::Admitted(id) | RequestOutcome::Queued(id) => id,
        }
    }
}

/// The simulation runner.
///
/// Each step handles one timestamp in three phases:
///
/// 1. **Drain**: every group holding events at the tick applies them
///    (role and cancellation changes, finishes, scheduled requests).  With
///    a concurrent strategy and the `parallel` feature, groups drain on a
///    Rayon pool.
/// 2. **Merge**: group outputs are merged in group order.  Resources that
///    gained availability reset the feasibility of every activity that can
///    use them, in every group that owns one of their roles.  The flow
///    layer sees finished and interrupted items and may request more work.
/// 3. **Settle**: groups match waiting items until no group is dirty.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<F: FlowLayer> {
    /// Run configuration (start/end tick, seed, thread count, ...).
    pub config: SimConfig,

    /// Global clock; the minimum over the groups' next events.
    pub clock: SimClock,

    pub(crate) store:           ResourceStore,
    pub(crate) activities:      Vec<Activity>,
    pub(crate) zones:           ConflictZones,
    pub(crate) groups:          Vec<Group>,
    /// Scheduling group of every resource type, by `ResourceTypeId`.
    pub(crate) type_group:      Vec<GroupId>,
    /// Scheduling group of every activity, by `ActivityId`.
    pub(crate) activity_group:  Vec<GroupId>,
    pub(crate) resource_groups: Vec<Vec<GroupId>>,
    pub(crate) next_item:       u64,
    pub(crate) flow:            F,
    pub(crate) outbox:          Vec<SimEvent>,
    pub(crate) started:         bool,
    pub(crate) resumed:         bool,
    pub(crate) concurrent:      bool,
    #[cfg(feature = "parallel")]
    pub(crate) pool:            Option<rayon::ThreadPool>,
}

impl<F: FlowLayer> Sim<F> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick until no event remains before
    /// `config.end_tick`.
    ///
    /// Use [`NoopObserver`][crate::NoopObserver] if you don't need the
    /// event stream.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        self.ensure_started()?;
        while self.step(observer)? {}

        // Park the clock at the horizon when work remains beyond it, so a
        // snapshot taken now resumes from there.
        if self.next_tick().is_some() {
            let end = self.config.end_tick;
            self.clock.advance_to(end)?;
            for group in &mut self.groups {
                group.queue.advance_to(end)?;
            }
        }

        let end = self.clock.current_tick;
        info!(tick = %end, "simulation end");
        self.outbox.push(SimEvent::SimEnd { tick: end });
        self.flush(observer);
        Ok(())
    }

    /// Process the next timestamp.  Returns `false` once nothing is left
    /// before `config.end_tick`.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<bool> {
        self.ensure_started()?;
        let next = match self.next_tick() {
            Some(t) if t < self.config.end_tick => t,
            _ => {
                self.flush(observer);
                return Ok(false);
            }
        };

        self.clock.advance_to(next)?;
        for group in &mut self.groups {
            group.queue.advance_to(next)?;
        }

        let outputs = self.on_groups(|g| g.queue.next_tick() == Some(next), |g, sh| g.drain(next, sh))?;
        self.absorb(outputs)?;
        self.settle()?;
        self.flush(observer);
        Ok(true)
    }

    /// Request `activity` for `element` now.
    pub fn request_activity(&mut self, element: ElementId, activity: ActivityId) -> SimResult<RequestOutcome> {
        self.ensure_started()?;
        let (group, id) = self.enqueue_request(element, activity)?;
        self.settle()?;
        let running = self.groups[group.index()].items.get(&id).is_some_and(WorkItem::is_running);
        Ok(if running { RequestOutcome::Admitted(id) } else { RequestOutcome::Queued(id) })
    }

    /// Request `activity` for `element` at a future tick.  The item is
    /// created, and counts as arrived, when the tick is reached.
    pub fn schedule_request(&mut self, at: Tick, element: ElementId, activity: ActivityId) -> SimResult<WorkItemId> {
        let group = self.group_of_activity(activity)?;
        let id = self.alloc_item();
        self.groups[group.index()]
            .queue
            .push(at, PRIO_REQUEST, EngineEvent::Request { item: id, element, activity })?;
        Ok(id)
    }

    /// Finish a running item early, releasing its resources.
    pub fn release_resources(&mut self, item: WorkItemId) -> SimResult<()> {
        self.ensure_started()?;
        let g = self.group_of_item(item).ok_or(SimError::UnknownItem(item))?;
        if !self.groups[g].items.get(&item).is_some_and(WorkItem::is_running) {
            return Err(SimError::NotRunning(item));
        }

        let now = self.clock.current_tick;
        let sh = Shared {
            store:           &self.store,
            activities:      &self.activities,
            zones:           &self.zones,
            resource_groups: &self.resource_groups,
        };
        let mut out = StepOutput::default();
        self.groups[g].finish(item, now, &sh, &mut out)?;
        self.absorb(vec![out])?;
        self.settle()
    }

    /// Withdraw a request that has not started.  Returns `false` if the item
    /// is already running.
    pub fn cancel_request(&mut self, item: WorkItemId) -> SimResult<bool> {
        let cancelled = if let Some(g) = self.group_of_item(item) {
            self.groups[g].cancel(item).ok_or(SimError::UnknownItem(item))?
        } else if self.groups.iter_mut().any(|g| g.cancel_scheduled(item)) {
            true
        } else {
            return Err(SimError::UnknownItem(item));
        };
        if cancelled {
            debug!(%item, "request cancelled");
            self.outbox.push(SimEvent::RequestCancelled { tick: self.clock.current_tick, item });
        }
        Ok(cancelled)
    }

    /// The earliest pending event over all groups.
    pub fn next_tick(&self) -> Option<Tick> {
        self.groups.iter().filter_map(|g| g.queue.next_tick()).min()
    }

    pub fn now(&self) -> Tick {
        self.clock.current_tick
    }

    pub fn work_item(&self, item: WorkItemId) -> Option<&WorkItem> {
        self.groups.iter().find_map(|g| g.items.get(&item))
    }

    pub fn arrival_ts(&self, item: WorkItemId) -> Option<Tick> {
        self.work_item(item).map(|it| it.arrival_ts)
    }

    /// Ticks until `item` finishes (running) or still owed (interrupted).
    pub fn time_left(&self, item: WorkItemId) -> Option<u64> {
        self.work_item(item).and_then(|it| it.remaining_at(self.clock.current_tick))
    }

    /// Items waiting for `activity`, in service order.
    pub fn queued(&self, activity: ActivityId) -> Vec<WorkItemId> {
        self.activity_group
            .get(activity.index())
            .and_then(|g| self.groups[g.index()].waiting.get(&activity))
            .map(|line| line.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn zones(&self) -> &ConflictZones {
        &self.zones
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    pub fn flow_mut(&mut self) -> &mut F {
        &mut self.flow
    }

    /// Capture the dynamic state at the current tick boundary.
    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            tick:      self.clock.current_tick,
            next_item: self.next_item,
            resources: self.store.resources().iter().map(|r| r.lock().clone()).collect(),
            groups:    self.groups.iter().map(Group::snapshot).collect(),
        }
    }

    // ── Start-up ──────────────────────────────────────────────────────────

    fn ensure_started(&mut self) -> SimResult<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        let now = self.clock.current_tick;
        info!(
            tick = %now,
            groups = self.groups.len(),
            resources = self.store.num_resources(),
            activities = self.activities.len(),
            concurrent = self.concurrent,
            resumed = self.resumed,
            "simulation start"
        );
        self.outbox.push(SimEvent::SimStart { tick: now });

        if !self.resumed {
            self.init_timetables()?;
            let intents = {
                let ctx = FlowContext::new(now, self.config.tick_duration_secs, &self.activities);
                self.flow.on_start(&ctx)
            };
            self.apply_intents(intents)?;
        }
        self.settle()
    }

    /// Seed every timetable and cancellation iterator and queue its first
    /// occurrence.  A resource with no occurrence at all ends right away.
    fn init_timetables(&mut self) -> SimResult<()> {
        let start = self.clock.current_tick;
        let end = self.config.end_tick;
        let seed = self.config.seed;

        for res in self.store.resources() {
            let mut valid = 0u32;
            for (e, entry) in res.timetable.iter().enumerate() {
                let group = &mut self.groups[self.type_group[entry.role.index()].index()];
                let rng = SimRng::for_stream(seed, stream_id(res.id, e, false));
                let mut it = entry.cycle.iter(start, end, rng);
                if let Some(ts) = it.next() {
                    group.queue.push(ts, PRIO_GAIN, EngineEvent::RoleOn { resource: res.id, entry: e })?;
                    valid += 1;
                }
                group.timetables.insert((res.id, e), it);
            }

            let ended = {
                let mut state = res.lock();
                state.valid_entries = valid;
                state.ended = valid == 0;
                state.ended
            };
            if ended {
                debug!(resource = %res.id, "resource has no occurrence in range");
                self.outbox.push(SimEvent::ResourceEnded { tick: start, resource: res.id });
            }

            let Some(primary) = res.primary_role() else {
                continue;
            };
            let group = &mut self.groups[self.type_group[primary.index()].index()];
            for (e, entry) in res.cancellations.iter().enumerate() {
                let rng = SimRng::for_stream(seed, stream_id(res.id, e, true));
                let mut it = entry.cycle.iter(start, end, rng);
                if let Some(ts) = it.next() {
                    group
                        .queue
                        .push(ts, PRIO_LOSS, EngineEvent::CancelOn { resource: res.id, entry: e })?;
                }
                group.cancellations.insert((res.id, e), it);
            }
        }
        Ok(())
    }

    // ── Phases ────────────────────────────────────────────────────────────

    /// Run `op` on every group accepted by `select`, in group order.
    fn on_groups<S, Op>(&mut self, select: S, op: Op) -> SimResult<Vec<StepOutput>>
    where
        S: Fn(&Group) -> bool + Sync,
        Op: Fn(&mut Group, &Shared<'_>) -> SimResult<StepOutput> + Sync,
    {
        let sh = Shared {
            store:           &self.store,
            activities:      &self.activities,
            zones:           &self.zones,
            resource_groups: &self.resource_groups,
        };
        let groups = &mut self.groups;

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            if self.concurrent {
                let run = |groups: &mut [Group]| -> SimResult<Vec<StepOutput>> {
                    groups.par_iter_mut().filter(|g| select(g)).map(|g| op(g, &sh)).collect()
                };
                return match &self.pool {
                    Some(pool) => pool.install(|| run(groups)),
                    None => run(groups),
                };
            }
        }

        groups.iter_mut().filter(|g| select(g)).map(|g| op(g, &sh)).collect()
    }

    /// Merge group outputs in group order.
    fn absorb(&mut self, outputs: Vec<StepOutput>) -> SimResult<()> {
        let mut finished = Vec::new();
        let mut interrupted = Vec::new();
        for out in outputs {
            self.outbox.extend(out.events);
            for resource in out.touched {
                self.notify(resource)?;
            }
            finished.extend(out.finished);
            interrupted.extend(out.interrupted);
        }

        let now = self.clock.current_tick;
        for item in interrupted {
            let intents = {
                let ctx = FlowContext::new(now, self.config.tick_duration_secs, &self.activities);
                self.flow.on_interrupted(&item, &ctx)
            };
            self.apply_intents(intents)?;
        }
        for item in finished {
            let intents = {
                let ctx = FlowContext::new(now, self.config.tick_duration_secs, &self.activities);
                self.flow.on_finish(&item, &ctx)
            };
            self.apply_intents(intents)?;
        }
        Ok(())
    }

    /// `resource` may have become available to someone.
    fn notify(&mut self, resource: ResourceId) -> SimResult<()> {
        let roles: Vec<ResourceTypeId> = self.store.resource(resource)?.roles();
        for g in &self.resource_groups[resource.index()] {
            self.groups[g.index()].notify(&roles, &self.activities);
        }
        Ok(())
    }

    /// Match waiting items until every group is quiet.
    fn settle(&mut self) -> SimResult<()> {
        let now = self.clock.current_tick;
        while self.groups.iter().any(|g| g.dirty) {
            let outputs = self.on_groups(|g| g.dirty, |g, sh| g.settle(now, sh))?;
            self.absorb(outputs)?;
        }
        Ok(())
    }

    fn flush<O: SimObserver>(&mut self, observer: &mut O) {
        for event in self.outbox.drain(..) {
            observer.on_event(&event);
        }
    }

    // ── Requests ──────────────────────────────────────────────────────────

    fn apply_intents(&mut self, intents: Vec<FlowIntent>) -> SimResult<()> {
        for intent in intents {
            match intent {
                FlowIntent::Request { element, activity } => {
                    self.enqueue_request(element, activity)?;
                }
                FlowIntent::RequestAt { at, element, activity } => {
                    self.schedule_request(at, element, activity)?;
                }
                FlowIntent::Cancel(item) => {
                    self.cancel_request(item)?;
                }
            }
        }
        Ok(())
    }

    fn enqueue_request(&mut self, element: ElementId, activity: ActivityId) -> SimResult<(GroupId, WorkItemId)> {
        let group = self.group_of_activity(activity)?;
        let id = self.alloc_item();
        let now = self.clock.current_tick;
        self.groups[group.index()].enqueue(WorkItem::new(id, element, activity, now));
        self.outbox.push(SimEvent::ActivityRequested { tick: now, item: id, element, activity });
        Ok((group, id))
    }

    fn alloc_item(&mut self) -> WorkItemId {
        let id = WorkItemId(self.next_item);
        self.next_item += 1;
        id
    }

    fn group_of_activity(&self, activity: ActivityId) -> SimResult<GroupId> {
        self.activity_group
            .get(activity.index())
            .copied()
            .ok_or(SimError::UnknownActivity(activity))
    }

    fn group_of_item(&self, item: WorkItemId) -> Option<usize> {
        self.groups.iter().position(|g| g.items.contains_key(&item))
    }
}
