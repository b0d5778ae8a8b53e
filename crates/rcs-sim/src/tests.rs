//! Integration tests for rcs-sim.

use std::collections::BTreeMap;

use rcs_activity::{Activity, WorkGroup};
use rcs_core::{ActivityId, ElementId, ResourceId, ResourceTypeId, SimConfig, Tick, TimeFunction, WorkItemId};
use rcs_resource::{ResourceStore, ResourceStoreBuilder};
use rcs_schedule::Cycle;

use crate::{EventLog, SimEvent};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn config(end: u64) -> SimConfig {
    SimConfig { start_tick: Tick(0), end_tick: Tick(end), seed: 42, ..SimConfig::default() }
}

/// One resource per role, on duty from tick 0 for `shift` ticks.
fn staff(roles: &[&str], shift: u64) -> ResourceStore {
    let mut b = ResourceStoreBuilder::new();
    let types: Vec<ResourceTypeId> = roles.iter().map(|r| b.add_type(*r)).collect();
    for (i, &t) in types.iter().enumerate() {
        let r = b.add_resource(format!("R{i}"));
        b.add_timetable(r, Cycle::once(0), TimeFunction::Constant(shift), t);
    }
    b.build().unwrap()
}

fn activity(name: &str, needs: &[(u16, u32)], duration: u64) -> Activity {
    Activity::new(name).with_work_group(
        0,
        WorkGroup::new(needs.iter().map(|&(t, n)| (ResourceTypeId(t), n))),
        TimeFunction::Constant(duration),
    )
}

fn started(log: &EventLog) -> Vec<(u64, WorkItemId)> {
    log.events
        .iter()
        .filter_map(|e| match *e {
            SimEvent::ActivityStarted { tick, item, .. } => Some((tick.0, item)),
            _ => None,
        })
        .collect()
}

fn finished(log: &EventLog) -> Vec<(u64, WorkItemId)> {
    log.events
        .iter()
        .filter_map(|e| match *e {
            SimEvent::ActivityFinished { tick, item, .. } => Some((tick.0, item)),
            _ => None,
        })
        .collect()
}

/// Caught/released events for `resource`, as `(tick, caught?)`.
fn holds(log: &EventLog, resource: ResourceId) -> Vec<(u64, bool)> {
    log.events
        .iter()
        .filter_map(|e| match *e {
            SimEvent::ResourceCaught { tick, resource: r, .. } if r == resource => Some((tick.0, true)),
            SimEvent::ResourceReleased { tick, resource: r, .. } if r == resource => Some((tick.0, false)),
            _ => None,
        })
        .collect()
}

/// `true` if no resource is caught again before its holder releases it.
fn exclusive(log: &EventLog) -> bool {
    let mut held: BTreeMap<ResourceId, WorkItemId> = BTreeMap::new();
    for e in &log.events {
        match *e {
            SimEvent::ResourceCaught { resource, item, .. } => {
                if held.insert(resource, item).is_some() {
                    return false;
                }
            }
            SimEvent::ResourceReleased { resource, item, .. } => {
                if held.remove(&resource) != Some(item) {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}

fn w(i: u64) -> WorkItemId {
    WorkItemId(i)
}

const E0: ElementId = ElementId(0);
const E1: ElementId = ElementId(1);

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use rcs_activity::NoopFlow;

    use super::*;
    use crate::{Partitioned, SimBuilder, SimError};

    #[test]
    fn assigns_activity_ids_in_order() {
        let acts = vec![activity("a", &[(0, 1)], 1), activity("b", &[(0, 1)], 1)];
        let sim = SimBuilder::new(config(10), staff(&["T"], 5), acts, NoopFlow).build().unwrap();
        let ids: Vec<ActivityId> = sim.activities().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![ActivityId(0), ActivityId(1)]);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let acts = vec![activity("a", &[(3, 1)], 1)];
        let err = SimBuilder::new(config(10), staff(&["T"], 5), acts, NoopFlow).build();
        assert!(matches!(err, Err(SimError::Activity(_))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = SimConfig { start_tick: Tick(10), end_tick: Tick(5), ..SimConfig::default() };
        let err = SimBuilder::new(cfg, staff(&["T"], 5), vec![], NoopFlow).build();
        assert!(matches!(err, Err(SimError::Core(_))));
    }

    #[test]
    fn activity_spanning_groups_is_rejected() {
        let acts = vec![activity("both", &[(0, 1), (1, 1)], 1)];
        let err = SimBuilder::new(config(10), staff(&["T0", "T1"], 5), acts, NoopFlow)
            .strategy(Partitioned::new(vec![vec![ResourceTypeId(0)], vec![ResourceTypeId(1)]]))
            .build();
        assert!(matches!(err, Err(SimError::ActivitySpansGroups { activity: ActivityId(0) })));
    }

    #[test]
    fn partition_must_cover_every_type() {
        let err = SimBuilder::new(config(10), staff(&["T0", "T1"], 5), vec![], NoopFlow)
            .strategy(Partitioned::new(vec![vec![ResourceTypeId(0)]]))
            .build();
        assert!(matches!(err, Err(SimError::Config(_))));
    }
}

// ── Requests and matching ─────────────────────────────────────────────────────

#[cfg(test)]
mod requests {
    use rcs_activity::NoopFlow;

    use super::*;
    use crate::{NoopObserver, RequestOutcome, SimBuilder, SimError};

    /// A0 needs R0; A1 needs R0 and R1.
    fn contended(end: u64) -> crate::Sim<NoopFlow> {
        let acts = vec![activity("A0", &[(0, 1)], 10), activity("A1", &[(0, 1), (1, 1)], 5)];
        SimBuilder::new(config(end), staff(&["T0", "T1"], 1000), acts, NoopFlow).build().unwrap()
    }

    #[test]
    fn contended_resource_goes_to_one_request_at_a_time() {
        let mut sim = contended(2000);
        sim.schedule_request(Tick(0), E0, ActivityId(0)).unwrap();
        sim.schedule_request(Tick(0), E1, ActivityId(1)).unwrap();

        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        assert_eq!(started(&log), vec![(0, w(0)), (10, w(1))]);
        assert_eq!(finished(&log), vec![(10, w(0)), (15, w(1))]);
        assert_eq!(holds(&log, ResourceId(0)), vec![(0, true), (10, false), (10, true), (15, false)]);
    }

    #[test]
    fn request_outcome_reports_admission() {
        let mut sim = contended(2000);
        // Process the role activations at tick 0.
        assert!(sim.step(&mut NoopObserver).unwrap());

        let first = sim.request_activity(E0, ActivityId(0)).unwrap();
        let second = sim.request_activity(E1, ActivityId(1)).unwrap();
        assert_eq!(first, RequestOutcome::Admitted(w(0)));
        assert_eq!(second, RequestOutcome::Queued(w(1)));
        assert_eq!(sim.queued(ActivityId(1)), vec![w(1)]);
        assert_eq!(sim.time_left(w(0)), Some(10));
        assert_eq!(sim.arrival_ts(w(1)), Some(Tick(0)));
    }

    #[test]
    fn request_before_role_activation_waits() {
        let mut sim = contended(2000);
        // Roles are not active until the tick-0 events are drained.
        let out = sim.request_activity(E0, ActivityId(0)).unwrap();
        assert_eq!(out, RequestOutcome::Queued(w(0)));

        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();
        assert_eq!(started(&log), vec![(0, w(0))]);
    }

    #[test]
    fn early_release_starts_the_next_item() {
        let mut sim = contended(2000);
        sim.step(&mut NoopObserver).unwrap();
        sim.request_activity(E0, ActivityId(0)).unwrap();
        sim.request_activity(E1, ActivityId(1)).unwrap();

        assert!(matches!(sim.release_resources(w(1)), Err(SimError::NotRunning(_))));
        sim.release_resources(w(0)).unwrap();
        assert!(sim.work_item(w(0)).is_none());
        assert!(sim.work_item(w(1)).is_some_and(|it| it.is_running()));
    }

    #[test]
    fn cancel_request_only_withdraws_waiting_items() {
        let mut sim = contended(2000);
        sim.step(&mut NoopObserver).unwrap();
        sim.request_activity(E0, ActivityId(0)).unwrap();
        sim.request_activity(E1, ActivityId(1)).unwrap();
        let later = sim.schedule_request(Tick(50), E1, ActivityId(0)).unwrap();

        assert!(!sim.cancel_request(w(0)).unwrap());
        assert!(sim.cancel_request(w(1)).unwrap());
        assert!(sim.cancel_request(later).unwrap());
        assert!(matches!(sim.cancel_request(w(99)), Err(SimError::UnknownItem(_))));

        // Events raised between steps reach the next observer.
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();
        assert_eq!(started(&log), vec![(0, w(0))]);
        assert_eq!(finished(&log), vec![(10, w(0))]);
        assert_eq!(log.count(|e| matches!(e, SimEvent::ActivityRequested { .. })), 2);
        assert_eq!(log.count(|e| matches!(e, SimEvent::RequestCancelled { .. })), 2);
    }

    #[test]
    fn scheduling_into_the_past_is_a_causality_error() {
        let mut sim = contended(100);
        sim.run(&mut NoopObserver).unwrap();
        // Role-off events at 1000 remain, so the clock parks at the horizon.
        assert_eq!(sim.now(), Tick(100));
        assert!(matches!(
            sim.schedule_request(Tick(50), E0, ActivityId(0)),
            Err(SimError::Schedule(_))
        ));
    }

    #[test]
    fn observed_ticks_never_decrease() {
        let mut sim = contended(2000);
        for i in 0..6 {
            sim.schedule_request(Tick(i * 3), ElementId(i as u32), ActivityId((i % 2) as u16)).unwrap();
        }
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();
        let ticks: Vec<Tick> = log.ticks().collect();
        assert!(ticks.windows(2).all(|p| p[0] <= p[1]));
        assert!(matches!(log.events.first(), Some(SimEvent::SimStart { .. })));
        assert!(matches!(log.events.last(), Some(SimEvent::SimEnd { .. })));
    }
}

// ── Timetables, cancellations, hooks ──────────────────────────────────────────

#[cfg(test)]
mod availability {
    use rcs_activity::NoopFlow;
    use rcs_core::ResourceTypeId;
    use rcs_resource::RoleHook;
    use rcs_schedule::CycleEnd;

    use super::*;
    use crate::SimBuilder;

    #[test]
    fn resource_without_occurrences_ends_at_start() {
        let mut b = ResourceStoreBuilder::new();
        let t = b.add_type("T");
        let late = b.add_resource("late");
        b.add_timetable(late, Cycle::once(5_000), TimeFunction::Constant(10), t);
        let idle = b.add_resource("idle");
        let store = b.build().unwrap();

        let mut sim = SimBuilder::new(config(100), store, vec![], NoopFlow).build().unwrap();
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        for r in [late, idle] {
            assert!(log.events.contains(&SimEvent::ResourceEnded { tick: Tick(0), resource: r }));
            assert!(sim.store().resource(r).unwrap().lock().ended);
        }
        assert_eq!(log.count(|e| matches!(e, SimEvent::RoleOn { .. })), 0);
    }

    #[test]
    fn resource_ends_after_its_last_occurrence() {
        let mut b = ResourceStoreBuilder::new();
        let t = b.add_type("T");
        let r = b.add_resource("R");
        b.add_timetable(r, Cycle::periodic(0, 10, CycleEnd::Iterations(2)), TimeFunction::Constant(4), t);
        let store = b.build().unwrap();

        let mut sim = SimBuilder::new(config(100), store, vec![], NoopFlow).build().unwrap();
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        let on: Vec<u64> = log
            .events
            .iter()
            .filter_map(|e| matches!(e, SimEvent::RoleOn { .. }).then(|| e.tick().0))
            .collect();
        assert_eq!(on, vec![0, 10]);
        assert!(log.events.contains(&SimEvent::ResourceEnded { tick: Tick(14), resource: r }));
    }

    #[test]
    fn cancellation_blocks_matching_until_it_ends() {
        let mut b = ResourceStoreBuilder::new();
        let t = b.add_type("T");
        let r = b.add_resource("R");
        b.add_timetable(r, Cycle::once(0), TimeFunction::Constant(1000), t);
        b.add_cancellation(r, Cycle::once(5), TimeFunction::Constant(10));
        let store = b.build().unwrap();

        let acts = vec![activity("A", &[(0, 1)], 3)];
        let mut sim = SimBuilder::new(config(100), store, acts, NoopFlow).build().unwrap();
        sim.schedule_request(Tick(6), E0, ActivityId(0)).unwrap();
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        assert!(log.events.contains(&SimEvent::CancelOn { tick: Tick(5), resource: r, until: Tick(15) }));
        assert_eq!(started(&log), vec![(15, w(0))]);
    }

    struct LateStart;

    impl RoleHook for LateStart {
        fn before_role_on(&self, _r: ResourceId, _role: ResourceTypeId, tick: Tick) -> u64 {
            7u64.saturating_sub(tick.0)
        }
    }

    #[test]
    fn before_hook_delays_activation() {
        let mut b = ResourceStoreBuilder::new();
        let t = b.add_type_with_hook("T", LateStart);
        let r = b.add_resource("R");
        b.add_timetable(r, Cycle::once(0), TimeFunction::Constant(100), t);
        let store = b.build().unwrap();

        let mut sim = SimBuilder::new(config(50), store, vec![], NoopFlow).build().unwrap();
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        assert!(log.events.contains(&SimEvent::RoleOn { tick: Tick(7), resource: r, role: t, until: Tick(107) }));
        assert_eq!(log.count(|e| matches!(e, SimEvent::RoleOn { .. })), 1);
    }

    struct LateEnd;

    impl RoleHook for LateEnd {
        fn before_role_off(&self, _r: ResourceId, _role: ResourceTypeId, tick: Tick) -> u64 {
            15u64.saturating_sub(tick.0)
        }
    }

    #[test]
    fn delayed_role_off_keeps_the_resource_usable() {
        let mut b = ResourceStoreBuilder::new();
        let t = b.add_type_with_hook("T", LateEnd);
        let r = b.add_resource("R");
        b.add_timetable(r, Cycle::once(0), TimeFunction::Constant(10), t);
        let store = b.build().unwrap();

        let acts = vec![activity("A", &[(0, 1)], 3)];
        let mut sim = SimBuilder::new(config(50), store, acts, NoopFlow).build().unwrap();
        sim.schedule_request(Tick(12), E0, ActivityId(0)).unwrap();
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        assert_eq!(started(&log), vec![(12, w(0))]);
        assert_eq!(finished(&log), vec![(15, w(0))]);
        assert!(log.events.contains(&SimEvent::RoleOff { tick: Tick(15), resource: r, role: t }));
        assert_eq!(log.count(|e| matches!(e, SimEvent::ResourceTimedOut { .. })), 0);
    }
}

// ── Role expiry while held ────────────────────────────────────────────────────

#[cfg(test)]
mod expiry {
    use rcs_activity::NoopFlow;
    use rcs_schedule::CycleEnd;

    use super::*;
    use crate::SimBuilder;

    /// R0 is on duty for 10 ticks out of every 20.
    fn part_time() -> ResourceStore {
        let mut b = ResourceStoreBuilder::new();
        let t = b.add_type("T");
        let r = b.add_resource("R0");
        b.add_timetable(r, Cycle::periodic(0, 20, CycleEnd::Unbounded), TimeFunction::Constant(10), t);
        b.build().unwrap()
    }

    #[test]
    fn interruptible_activity_resumes_for_the_remainder() {
        let acts = vec![activity("A", &[(0, 1)], 15).interruptible()];
        let mut sim = SimBuilder::new(config(100), part_time(), acts, NoopFlow).build().unwrap();
        sim.schedule_request(Tick(0), E0, ActivityId(0)).unwrap();
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        assert!(log.events.iter().any(|e| matches!(
            *e,
            SimEvent::ActivityInterrupted { tick: Tick(10), time_left: 5, .. }
        )));
        assert!(log.events.iter().any(|e| matches!(
            *e,
            SimEvent::ActivityStarted { tick: Tick(20), duration: 5, .. }
        )));
        assert_eq!(finished(&log), vec![(25, w(0))]);
    }

    #[test]
    fn non_interruptible_activity_runs_to_completion() {
        let acts = vec![activity("A", &[(0, 1)], 15)];
        let mut sim = SimBuilder::new(config(100), part_time(), acts, NoopFlow).build().unwrap();
        sim.schedule_request(Tick(0), E0, ActivityId(0)).unwrap();
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        assert!(log.events.contains(&SimEvent::ResourceTimedOut {
            tick:     Tick(10),
            resource: ResourceId(0),
            item:     w(0),
        }));
        assert_eq!(finished(&log), vec![(15, w(0))]);
        assert!(sim.store().resource(ResourceId(0)).unwrap().lock().holder.is_none());
    }

    #[test]
    fn interruptible_activity_ending_with_the_shift_finishes() {
        let acts = vec![activity("A", &[(0, 1)], 10).interruptible()];
        let mut sim = SimBuilder::new(config(100), part_time(), acts, NoopFlow).build().unwrap();
        sim.schedule_request(Tick(0), E0, ActivityId(0)).unwrap();
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        assert_eq!(log.count(|e| matches!(e, SimEvent::ActivityInterrupted { .. })), 0);
        assert_eq!(started(&log), vec![(0, w(0))]);
        assert_eq!(finished(&log), vec![(10, w(0))]);
    }

    #[test]
    fn activity_ending_with_the_shift_does_not_time_out() {
        let acts = vec![activity("A", &[(0, 1)], 10)];
        let mut sim = SimBuilder::new(config(100), part_time(), acts, NoopFlow).build().unwrap();
        sim.schedule_request(Tick(0), E0, ActivityId(0)).unwrap();
        sim.schedule_request(Tick(15), E1, ActivityId(0)).unwrap();
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        assert_eq!(log.count(|e| matches!(e, SimEvent::ResourceTimedOut { .. })), 0);
        assert_eq!(finished(&log), vec![(10, w(0)), (30, w(1))]);
        let state = sim.store().resource(ResourceId(0)).unwrap().lock().clone();
        assert!(!state.timed_out);
        assert!(state.holder.is_none());
    }
}

// ── Flow layer ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod flow {
    use rcs_activity::{FlowContext, FlowIntent, FlowLayer, WorkItem};

    use super::*;
    use crate::SimBuilder;

    /// Requests one visit at start and another after each finish, up to
    /// `limit` visits.
    struct Repeat {
        limit: usize,
        done:  usize,
    }

    impl FlowLayer for Repeat {
        fn on_start(&mut self, _ctx: &FlowContext<'_>) -> Vec<FlowIntent> {
            vec![FlowIntent::RequestAt { at: Tick(0), element: E0, activity: ActivityId(0) }]
        }

        fn on_finish(&mut self, item: &WorkItem, _ctx: &FlowContext<'_>) -> Vec<FlowIntent> {
            self.done += 1;
            if self.done < self.limit {
                vec![FlowIntent::Request { element: item.element, activity: item.activity }]
            } else {
                vec![]
            }
        }
    }

    #[test]
    fn flow_chains_requests_on_finish() {
        let acts = vec![activity("visit", &[(0, 1)], 10)];
        let mut sim =
            SimBuilder::new(config(1000), staff(&["T"], 500), acts, Repeat { limit: 3, done: 0 }).build().unwrap();
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        assert_eq!(finished(&log), vec![(10, w(0)), (20, w(1)), (30, w(2))]);
        assert_eq!(sim.flow().done, 3);
    }
}

// ── Partitioned strategy and shared resources ─────────────────────────────────

#[cfg(test)]
mod partitioned {
    use proptest::prelude::*;
    use rcs_activity::NoopFlow;
    use rcs_schedule::CycleEnd;

    use super::*;
    use crate::{Partitioned, SimBuilder};

    /// R0 plays both T0 and T1; R1 plays T0 only.
    fn shared_store() -> ResourceStore {
        let mut b = ResourceStoreBuilder::new();
        let t0 = b.add_type("T0");
        let t1 = b.add_type("T1");
        let r0 = b.add_resource("R0");
        let r1 = b.add_resource("R1");
        b.add_timetable(r0, Cycle::once(0), TimeFunction::Constant(1000), t0);
        b.add_timetable(r0, Cycle::once(0), TimeFunction::Constant(1000), t1);
        b.add_timetable(r1, Cycle::once(0), TimeFunction::Constant(1000), t0);
        b.build().unwrap()
    }

    #[test]
    fn shared_resource_is_never_double_held() {
        let acts = vec![activity("A0", &[(0, 1)], 10), activity("A1", &[(1, 1)], 10)];
        let mut sim = SimBuilder::new(config(2000), shared_store(), acts, NoopFlow)
            .strategy(Partitioned::new(vec![vec![ResourceTypeId(0)], vec![ResourceTypeId(1)]]))
            .build()
            .unwrap();
        for i in 0..4u64 {
            sim.schedule_request(Tick(i * 2), ElementId(i as u32), ActivityId((i % 2) as u16)).unwrap();
        }
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        assert_eq!(finished(&log).len(), 4);
        // Caught and released strictly alternate on the shared resource.
        let h = holds(&log, ResourceId(0));
        assert!(h.iter().enumerate().all(|(i, &(_, caught))| caught == (i % 2 == 0)));
        assert!(sim.zones().is_empty());
    }

    /// Resources cycle through T0, T1, or both; every third one is shared
    /// between the two groups.
    fn random_shared_run(seed: u64, requests: &[(u64, u16)]) -> EventLog {
        let mut b = ResourceStoreBuilder::new();
        let t0 = b.add_type("T0");
        let t1 = b.add_type("T1");
        for i in 0..6u32 {
            let r = b.add_resource(format!("R{i}"));
            let roles = match i % 3 {
                0 => vec![t0],
                1 => vec![t1],
                _ => vec![t0, t1],
            };
            for role in roles {
                b.add_timetable(
                    r,
                    Cycle::periodic_random(0, TimeFunction::Uniform { min: 20, max: 40 }, CycleEnd::Unbounded),
                    TimeFunction::Uniform { min: 5, max: 30 },
                    role,
                );
            }
            if i % 2 == 0 {
                b.add_cancellation(r, Cycle::periodic(13, 50, CycleEnd::Unbounded), TimeFunction::Constant(5));
            }
        }
        let store = b.build().unwrap();
        let acts = vec![
            activity("A0", &[(0, 1)], 4),
            Activity::new("A1").interruptible().with_work_group(
                0,
                WorkGroup::new([(ResourceTypeId(1), 1)]),
                TimeFunction::Uniform { min: 1, max: 12 },
            ),
            Activity::new("A2").with_priority(1).with_work_group(
                0,
                WorkGroup::new([(ResourceTypeId(0), 2)]),
                TimeFunction::Exponential { mean: 6.0 },
            ),
        ];
        let cfg = SimConfig { seed, ..config(300) };
        let mut sim = SimBuilder::new(cfg, store, acts, NoopFlow)
            .strategy(Partitioned::new(vec![vec![ResourceTypeId(0)], vec![ResourceTypeId(1)]]))
            .build()
            .unwrap();
        for (i, &(at, a)) in requests.iter().enumerate() {
            sim.schedule_request(Tick(at), ElementId(i as u32), ActivityId(a)).unwrap();
        }
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();
        log
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn shared_resources_have_one_holder_at_a_time(
            seed in any::<u64>(),
            requests in proptest::collection::vec((0u64..250, 0u16..3), 1..40),
        ) {
            let log = random_shared_run(seed, &requests);
            prop_assert!(exclusive(&log));
        }
    }

    #[cfg(not(feature = "parallel"))]
    #[test]
    fn groups_settle_in_group_order() {
        let acts = vec![activity("A0", &[(0, 1)], 10), activity("A1", &[(1, 1)], 10)];
        let mut sim = SimBuilder::new(config(2000), shared_store(), acts, NoopFlow)
            .strategy(Partitioned::new(vec![vec![ResourceTypeId(0)], vec![ResourceTypeId(1)]]))
            .build()
            .unwrap();
        sim.schedule_request(Tick(0), E0, ActivityId(0)).unwrap();
        sim.schedule_request(Tick(0), E1, ActivityId(1)).unwrap();
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();

        // Group 0 takes R0 first; A1 can only use R0 and waits for it.
        assert_eq!(started(&log), vec![(0, w(0)), (10, w(1))]);
    }
}

// ── Snapshots ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod snapshots {
    use rcs_activity::NoopFlow;

    use super::*;
    use crate::{SimBuilder, SimError, SimSnapshot};

    fn model() -> (ResourceStore, Vec<Activity>) {
        (staff(&["T"], 1000), vec![activity("A", &[(0, 1)], 10)])
    }

    fn queued_three(end: u64) -> crate::Sim<NoopFlow> {
        let (store, acts) = model();
        let mut sim = SimBuilder::new(config(end), store, acts, NoopFlow).build().unwrap();
        for i in 0..3 {
            sim.schedule_request(Tick(0), ElementId(i), ActivityId(0)).unwrap();
        }
        sim
    }

    #[test]
    fn resumed_run_matches_uninterrupted_run() {
        let mut full = queued_three(2000);
        let mut full_log = EventLog::new();
        full.run(&mut full_log).unwrap();

        let mut first = queued_three(15);
        let mut first_log = EventLog::new();
        first.run(&mut first_log).unwrap();
        let snap = first.snapshot();
        assert_eq!(snap.tick, Tick(15));

        let json = serde_json::to_string(&snap).unwrap();
        let back: SimSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);

        let (store, acts) = model();
        let mut resumed = SimBuilder::new(config(2000), store, acts, NoopFlow).resume_from(back).build().unwrap();
        let mut rest_log = EventLog::new();
        resumed.run(&mut rest_log).unwrap();

        let mut pieced = finished(&first_log);
        pieced.extend(finished(&rest_log));
        assert_eq!(pieced, finished(&full_log));
        assert_eq!(pieced, vec![(10, w(0)), (20, w(1)), (30, w(2))]);
    }

    #[test]
    fn snapshot_from_another_model_is_rejected() {
        let mut sim = queued_three(15);
        sim.run(&mut crate::NoopObserver).unwrap();
        let snap = sim.snapshot();

        let other = staff(&["T", "U"], 1000);
        let err = SimBuilder::new(config(2000), other, vec![activity("A", &[(0, 1)], 10)], NoopFlow)
            .resume_from(snap)
            .build();
        assert!(matches!(err, Err(SimError::Snapshot(_))));
    }
}

// ── Determinism ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod determinism {
    use proptest::prelude::*;
    use rcs_activity::NoopFlow;
    use rcs_schedule::CycleEnd;

    use super::*;
    use crate::SimBuilder;

    fn random_run(seed: u64) -> EventLog {
        let mut b = ResourceStoreBuilder::new();
        let t0 = b.add_type("T0");
        let t1 = b.add_type("T1");
        for i in 0..4u32 {
            let r = b.add_resource(format!("R{i}"));
            let role = if i % 2 == 0 { t0 } else { t1 };
            b.add_timetable(
                r,
                Cycle::periodic_random(0, TimeFunction::Uniform { min: 20, max: 40 }, CycleEnd::Unbounded),
                TimeFunction::Uniform { min: 5, max: 15 },
                role,
            );
        }
        let store = b.build().unwrap();
        let acts = vec![
            Activity::new("A").with_work_group(
                0,
                WorkGroup::new([(ResourceTypeId(0), 1)]),
                TimeFunction::Exponential { mean: 4.0 },
            ),
            Activity::new("B").with_priority(1).with_work_group(
                0,
                WorkGroup::new([(ResourceTypeId(0), 1), (ResourceTypeId(1), 1)]),
                TimeFunction::Uniform { min: 1, max: 6 },
            ),
        ];
        let cfg = SimConfig { seed, ..config(300) };
        let mut sim = SimBuilder::new(cfg, store, acts, NoopFlow).build().unwrap();
        for i in 0..20u64 {
            sim.schedule_request(Tick(i * 7), ElementId(i as u32), ActivityId((i % 2) as u16)).unwrap();
        }
        let mut log = EventLog::new();
        sim.run(&mut log).unwrap();
        log
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Same seed, same model: identical event streams.
        #[test]
        fn same_seed_same_stream(seed in any::<u64>()) {
            let log = random_run(seed);
            prop_assert!(exclusive(&log));
            prop_assert_eq!(log, random_run(seed));
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

#[cfg(test)]
mod config_loading {
    use crate::{parse_config, SimError};

    use super::*;

    #[test]
    fn parses_partial_toml() {
        let cfg = parse_config("end_tick = 500\nseed = 7\nnum_threads = 2\n").unwrap();
        assert_eq!(cfg.end_tick, Tick(500));
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.num_threads, Some(2));
        assert_eq!(cfg.start_tick, Tick(0));
        assert_eq!(cfg.tick_duration_secs, 60);
    }

    #[test]
    fn rejects_inverted_horizon() {
        assert!(matches!(parse_config("start_tick = 10\nend_tick = 10\n"), Err(SimError::Core(_))));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(parse_config("end_tick = \"soon\""), Err(SimError::Toml(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(crate::load_config("/nonexistent/rcs.toml"), Err(SimError::Io(_))));
    }
}
