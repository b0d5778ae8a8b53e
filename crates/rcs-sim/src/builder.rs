//! Fluent builder for constructing a [`Sim`].

use std::cmp::Reverse;
use std::collections::BTreeSet;

use rcs_activity::{Activity, FlowLayer};
use rcs_conflict::ConflictZones;
use rcs_core::{ActivityId, GroupId, SimClock, SimConfig, SimRng};
use rcs_resource::ResourceStore;
use tracing::debug;

use crate::group::Group;
use crate::snapshot::SimSnapshot;
use crate::strategy::{SchedulingStrategy, Sequential};
use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim<F>`].
///
/// # Required inputs
///
/// - [`SimConfig`] — horizon, seed, thread count, tick duration
/// - [`ResourceStore`] — from [`rcs_resource::ResourceStoreBuilder`]
/// - the activities; their ids are assigned here, in list order
/// - `F: FlowLayer` — the process logic ([`rcs_activity::NoopFlow`] for none)
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default              |
/// |----------------------|----------------------|
/// | `.strategy(s)`       | [`Sequential`]       |
/// | `.resume_from(snap)` | start from scratch   |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, store, activities, NoopFlow)
///     .strategy(Partitioned::new(vec![vec![doctor], vec![nurse, room]]))
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<F: FlowLayer> {
    config:     SimConfig,
    store:      ResourceStore,
    activities: Vec<Activity>,
    flow:       F,
    strategy:   Box<dyn SchedulingStrategy>,
    snapshot:   Option<SimSnapshot>,
}

impl<F: FlowLayer> SimBuilder<F> {
    pub fn new(config: SimConfig, store: ResourceStore, activities: Vec<Activity>, flow: F) -> Self {
        Self { config, store, activities, flow, strategy: Box::new(Sequential), snapshot: None }
    }

    pub fn strategy(mut self, strategy: impl SchedulingStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Continue from `snapshot` instead of starting at `config.start_tick`.
    /// The flow layer's `on_start` is not called again.
    pub fn resume_from(mut self, snapshot: SimSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Validate inputs and construct the [`Sim`].
    ///
    /// # Errors
    ///
    /// - [`SimError::Config`] for an invalid config or partition.
    /// - [`SimError::Activity`] for an activity naming unknown types.
    /// - [`SimError::ActivitySpansGroups`] if an activity needs types from
    ///   more than one scheduling group.
    /// - [`SimError::Snapshot`] if the snapshot was taken from another model.
    pub fn build(self) -> SimResult<Sim<F>> {
        let SimBuilder { config, store, mut activities, flow, strategy, snapshot } = self;
        config.validate()?;

        let num_types = store.num_types();
        let mut partition = strategy.groups(num_types)?;
        if partition.is_empty() {
            partition.push(Vec::new());
        }

        let mut type_group = vec![GroupId::INVALID; num_types];
        for (gi, types) in partition.iter().enumerate() {
            let gid = GroupId::try_from(gi).map_err(|_| SimError::Config("too many scheduling groups".into()))?;
            for t in types {
                type_group[t.index()] = gid;
            }
        }

        // ── Activities ────────────────────────────────────────────────────
        let mut activity_group = Vec::with_capacity(activities.len());
        for (i, activity) in activities.iter_mut().enumerate() {
            activity.id = ActivityId::try_from(i).map_err(|_| SimError::Config("too many activities".into()))?;
            activity.validate(num_types)?;
            let owners: BTreeSet<GroupId> = activity.types().iter().map(|t| type_group[t.index()]).collect();
            let gid = match owners.len() {
                0 => GroupId(0),
                1 => owners.into_iter().next().unwrap_or(GroupId(0)),
                _ => return Err(SimError::ActivitySpansGroups { activity: activity.id }),
            };
            activity_group.push(gid);
        }

        // ── Shared resources ──────────────────────────────────────────────
        let resource_groups: Vec<Vec<GroupId>> = store
            .resources()
            .iter()
            .map(|r| {
                let owners: BTreeSet<GroupId> = r.roles().iter().map(|t| type_group[t.index()]).collect();
                owners.into_iter().collect()
            })
            .collect();
        let shared = resource_groups.iter().filter(|g| g.len() > 1).count();

        // ── Groups ────────────────────────────────────────────────────────
        let start = snapshot.as_ref().map_or(config.start_tick, |s| s.tick);
        if start >= config.end_tick {
            return Err(SimError::Config(format!("resume tick {start} is not before end tick {}", config.end_tick)));
        }
        // Resumed runs draw from fresh streams.
        let seed = snapshot.as_ref().map_or(config.seed, |s| config.seed ^ s.tick.0.rotate_left(32));

        let mut groups = Vec::with_capacity(partition.len());
        for (gi, types) in partition.into_iter().enumerate() {
            let gid = GroupId::try_from(gi).map_err(|_| SimError::Config("too many scheduling groups".into()))?;
            let mut group = Group::new(gid, types, start, SimRng::for_stream(seed, gi as u64));

            let mut owned: Vec<&Activity> =
                activities.iter().filter(|a| activity_group[a.id.index()] == gid).collect();
            owned.sort_by_key(|a| (Reverse(a.priority), a.id));
            for a in owned {
                group.activity_order.push(a.id);
                for t in a.types() {
                    group.type_activities.entry(t).or_default().push(a.id);
                }
            }
            groups.push(group);
        }

        #[cfg(feature = "parallel")]
        let pool = if strategy.concurrent() {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.num_threads.unwrap_or(0))
                .build()
                .map_err(|e| SimError::Config(format!("thread pool: {e}")))?;
            Some(pool)
        } else {
            None
        };

        debug!(groups = groups.len(), shared, "scheduling groups built");

        let mut sim = Sim {
            clock: SimClock::new(start, config.tick_duration_secs),
            concurrent: strategy.concurrent(),
            config,
            store,
            activities,
            zones: ConflictZones::new(),
            groups,
            type_group,
            activity_group,
            resource_groups,
            next_item: 0,
            flow,
            outbox: Vec::new(),
            started: false,
            resumed: false,
            #[cfg(feature = "parallel")]
            pool,
        };

        if let Some(snap) = snapshot {
            restore(&mut sim, &snap, seed)?;
        }
        Ok(sim)
    }
}

/// Load a snapshot into a freshly built, not yet started `Sim`.
fn restore<F: FlowLayer>(sim: &mut Sim<F>, snap: &SimSnapshot, seed: u64) -> SimResult<()> {
    if snap.resources.len() != sim.store.num_resources() {
        return Err(SimError::Snapshot(format!(
            "{} resources in snapshot, {} in model",
            snap.resources.len(),
            sim.store.num_resources()
        )));
    }
    if snap.groups.len() != sim.groups.len() {
        return Err(SimError::Snapshot(format!(
            "{} scheduling groups in snapshot, {} in model",
            snap.groups.len(),
            sim.groups.len()
        )));
    }

    for (res, state) in sim.store.resources().iter().zip(&snap.resources) {
        *res.lock() = state.clone();
    }
    for (group, gs) in sim.groups.iter_mut().zip(&snap.groups) {
        group.restore(gs, &sim.store, seed)?;
        for item in group.items.values_mut() {
            if item.is_running() && !item.booked.is_empty() {
                item.zone = Some(sim.zones.book(item.id, &item.booked));
            }
        }
    }
    for activity in &sim.activities {
        activity.reset_feasible();
    }
    sim.next_item = snap.next_item;
    sim.resumed = true;
    Ok(())
}
