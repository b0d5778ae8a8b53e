//! Unit tests for rcs-resource.

#[cfg(test)]
mod state {
    use rcs_core::{ResourceTypeId, Tick, WorkItemId};

    use crate::{Holder, ResourceState};

    const SURGEON: ResourceTypeId = ResourceTypeId(0);
    const NURSE: ResourceTypeId = ResourceTypeId(1);

    #[test]
    fn available_only_while_role_active_and_unexpired() {
        let mut s = ResourceState::default();
        assert!(!s.is_available(SURGEON, Tick(0)));

        assert!(s.role_on(SURGEON, Tick(10)));
        assert!(s.is_available(SURGEON, Tick(0)));
        assert!(s.is_available(SURGEON, Tick(9)));
        assert!(!s.is_available(SURGEON, Tick(10)), "expiry is exclusive");
        assert!(!s.is_available(NURSE, Tick(0)));
    }

    #[test]
    fn overlapping_activations_are_counted() {
        let mut s = ResourceState::default();
        assert!(s.role_on(SURGEON, Tick(10)));
        assert!(!s.role_on(SURGEON, Tick(20)));
        assert_eq!(s.remaining(SURGEON, Tick(5)), Some(15));

        let first = s.role_off(SURGEON);
        assert!(first.still_active);
        assert!(s.is_active(SURGEON));

        let second = s.role_off(SURGEON);
        assert!(!second.still_active);
        assert!(!s.is_active(SURGEON));
        assert_eq!(s.remaining(SURGEON, Tick(5)), None);
    }

    #[test]
    fn single_holder() {
        let mut s = ResourceState::default();
        s.role_on(SURGEON, Tick(100));
        assert!(s.catch(WorkItemId(1), SURGEON));
        assert!(!s.catch(WorkItemId(2), SURGEON));
        assert!(!s.is_available(SURGEON, Tick(0)));

        assert_eq!(s.release(WorkItemId(2)), None, "only the holder can release");
        assert_eq!(s.release(WorkItemId(1)), Some(Holder { item: WorkItemId(1), role: SURGEON }));
        assert!(s.is_available(SURGEON, Tick(0)));
    }

    #[test]
    fn expiry_while_held_times_out_until_next_activation() {
        let mut s = ResourceState::default();
        s.role_on(SURGEON, Tick(10));
        s.role_on(NURSE, Tick(50));
        s.catch(WorkItemId(7), SURGEON);

        let out = s.role_off(SURGEON);
        assert_eq!(out.holder_timed_out, Some(Holder { item: WorkItemId(7), role: SURGEON }));
        assert!(s.timed_out);

        s.release(WorkItemId(7));
        assert!(!s.is_available(NURSE, Tick(20)), "timed-out resource stays out of the pool");

        s.role_on(SURGEON, Tick(60));
        assert!(!s.timed_out);
        assert!(s.is_available(NURSE, Tick(20)));
    }

    #[test]
    fn role_off_of_other_role_does_not_time_out_holder() {
        let mut s = ResourceState::default();
        s.role_on(SURGEON, Tick(10));
        s.role_on(NURSE, Tick(10));
        s.catch(WorkItemId(1), SURGEON);
        assert_eq!(s.role_off(NURSE).holder_timed_out, None);
        assert!(!s.timed_out);
    }

    #[test]
    fn cancellation_nests_and_blocks_every_role() {
        let mut s = ResourceState::default();
        s.role_on(SURGEON, Tick(100));
        s.role_on(NURSE, Tick(100));
        s.cancel_on();
        s.cancel_on();
        assert!(!s.is_available(SURGEON, Tick(0)));
        assert!(!s.is_available(NURSE, Tick(0)));
        s.cancel_off();
        assert!(!s.is_available(SURGEON, Tick(0)));
        s.cancel_off();
        assert!(s.is_available(SURGEON, Tick(0)));
        s.cancel_off();
        assert_eq!(s.cancelled, 0);
    }

    #[test]
    fn ends_once_when_last_entry_exhausts() {
        let mut s = ResourceState { valid_entries: 2, ..ResourceState::default() };
        assert!(!s.entry_exhausted());
        assert!(s.entry_exhausted());
        assert!(s.ended);
        assert!(!s.entry_exhausted(), "ending is reported once");
    }

    #[test]
    fn extend_role_only_lengthens_active_roles() {
        let mut s = ResourceState::default();
        s.role_on(SURGEON, Tick(10));
        s.extend_role(SURGEON, Tick(15));
        assert!(s.is_available(SURGEON, Tick(12)));
        s.extend_role(SURGEON, Tick(5));
        assert_eq!(s.remaining(SURGEON, Tick(0)), Some(15));
        s.extend_role(NURSE, Tick(50));
        assert!(!s.is_active(NURSE));
    }
}

#[cfg(test)]
mod roster {
    use rcs_core::ResourceId;

    use crate::Roster;

    #[test]
    fn stays_sorted_and_unique() {
        let mut r = Roster::new();
        for id in [5, 1, 3, 1, 9] {
            r.insert(ResourceId(id));
        }
        assert_eq!(r.as_slice(), &[ResourceId(1), ResourceId(3), ResourceId(5), ResourceId(9)]);
        assert!(!r.insert(ResourceId(3)));

        assert!(r.remove(ResourceId(3)));
        assert!(!r.remove(ResourceId(3)));
        assert!(!r.contains(ResourceId(3)));
        assert_eq!(r.len(), 3);
    }
}

#[cfg(test)]
mod hooks {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use rcs_core::{ResourceId, ResourceTypeId, Tick};

    use crate::{NoHook, RoleHook, RoleHookExt};

    struct Delay(u64);

    impl RoleHook for Delay {
        fn before_role_on(&self, _: ResourceId, _: ResourceTypeId, _: Tick) -> u64 {
            self.0
        }
        fn before_role_off(&self, _: ResourceId, _: ResourceTypeId, _: Tick) -> u64 {
            self.0 * 2
        }
    }

    struct Count(Arc<AtomicU32>);

    impl RoleHook for Count {
        fn after_role_on(&self, _: ResourceId, _: ResourceTypeId, _: Tick) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn no_hook_never_delays() {
        assert_eq!(NoHook.before_role_on(ResourceId(0), ResourceTypeId(0), Tick(0)), 0);
        assert_eq!(NoHook.before_role_off(ResourceId(0), ResourceTypeId(0), Tick(0)), 0);
    }

    #[test]
    fn chained_delays_add_and_after_hooks_all_run() {
        let counter = Arc::new(AtomicU32::new(0));
        let hook = Delay(3).then(Delay(4)).then(Count(counter.clone()));

        assert_eq!(hook.before_role_on(ResourceId(0), ResourceTypeId(0), Tick(0)), 7);
        assert_eq!(hook.before_role_off(ResourceId(0), ResourceTypeId(0), Tick(0)), 14);

        hook.after_role_on(ResourceId(0), ResourceTypeId(0), Tick(0));
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }
}

#[cfg(test)]
mod builder {
    use rcs_core::{ResourceId, ResourceTypeId, TimeFunction};
    use rcs_schedule::{Cycle, CycleEnd};

    use crate::{ResourceError, ResourceStoreBuilder};

    #[test]
    fn builds_dense_arenas() {
        let mut b = ResourceStoreBuilder::new();
        let surgeon = b.add_type("Surgeon");
        let nurse = b.add_type("Nurse");
        let alice = b.add_resource("Alice");
        let bob = b.add_resource("Bob");
        b.add_timetable(alice, Cycle::once(0), TimeFunction::Constant(10), surgeon)
            .add_timetable(alice, Cycle::once(20), TimeFunction::Constant(10), nurse)
            .add_timetable(alice, Cycle::once(40), TimeFunction::Constant(10), surgeon)
            .add_timetable(bob, Cycle::once(0), TimeFunction::Constant(10), nurse)
            .add_cancellation(bob, Cycle::once(5), TimeFunction::Constant(2));

        let store = b.build().unwrap();
        assert_eq!(store.num_types(), 2);
        assert_eq!(store.num_resources(), 2);
        assert_eq!(store.resource_type(nurse).unwrap().description, "Nurse");

        let a = store.resource(alice).unwrap();
        assert_eq!(a.roles(), vec![surgeon, nurse]);
        assert_eq!(a.primary_role(), Some(surgeon));
        assert_eq!(store.resource(bob).unwrap().cancellations.len(), 1);
        assert_eq!(store.players_of(nurse), vec![alice, bob]);
    }

    #[test]
    fn unknown_role_rejected() {
        let mut b = ResourceStoreBuilder::new();
        let r = b.add_resource("R");
        b.add_timetable(r, Cycle::once(0), TimeFunction::Constant(1), ResourceTypeId(3));
        assert!(matches!(b.build(), Err(ResourceError::TypeNotFound(ResourceTypeId(3)))));
    }

    #[test]
    fn unknown_resource_rejected() {
        let mut b = ResourceStoreBuilder::new();
        let t = b.add_type("T");
        b.add_timetable(ResourceId(9), Cycle::once(0), TimeFunction::Constant(1), t);
        assert!(matches!(b.build(), Err(ResourceError::ResourceNotFound(ResourceId(9)))));
    }

    #[test]
    fn invalid_duration_rejected() {
        let mut b = ResourceStoreBuilder::new();
        let t = b.add_type("T");
        let r = b.add_resource("R");
        b.add_timetable(
            r,
            Cycle::periodic(0, 10, CycleEnd::Unbounded),
            TimeFunction::Uniform { min: 5, max: 1 },
            t,
        );
        assert!(matches!(b.build(), Err(ResourceError::Duration { .. })));
    }

    #[test]
    fn lookups_out_of_range() {
        let store = ResourceStoreBuilder::new().build().unwrap();
        assert!(store.resource(ResourceId(0)).is_err());
        assert!(store.resource_type(ResourceTypeId(0)).is_err());
    }
}
