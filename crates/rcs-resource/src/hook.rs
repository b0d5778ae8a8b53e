//! `RoleHook` — model callbacks around role activation and deactivation.
//!
//! The engine calls the *before* hooks when a `RoleOn` / `RoleOff` event
//! fires.  A non-zero return value postpones the transition: the event is
//! pushed back into the queue `delay` ticks later and the hook is asked
//! again at that time.  The *after* hooks run once the transition has been
//! applied.
//!
//! Hooks are composable: `shift_change.then(handover)` sums the delays of
//! both hooks and calls both after-hooks in order.

use rcs_core::{ResourceId, ResourceTypeId, Tick};

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Callbacks attached to a resource type.
///
/// # Contract
///
/// - Must be deterministic.
/// - Must not block or perform I/O.
/// - Implementations must be `Send + Sync` (called from group worker threads).
pub trait RoleHook: Send + Sync {
    /// Delay in ticks before `resource` may start playing `role`.
    fn before_role_on(&self, _resource: ResourceId, _role: ResourceTypeId, _tick: Tick) -> u64 {
        0
    }

    fn after_role_on(&self, _resource: ResourceId, _role: ResourceTypeId, _tick: Tick) {}

    /// Delay in ticks before `resource` stops playing `role`.
    fn before_role_off(&self, _resource: ResourceId, _role: ResourceTypeId, _tick: Tick) -> u64 {
        0
    }

    fn after_role_off(&self, _resource: ResourceId, _role: ResourceTypeId, _tick: Tick) {}
}

// ── No-op ─────────────────────────────────────────────────────────────────────

/// A hook that never delays and does nothing afterwards.
pub struct NoHook;

impl RoleHook for NoHook {}

// ── Chained hook ──────────────────────────────────────────────────────────────

/// Runs two hooks in sequence.  Delays add up (saturating).
pub struct ChainedHook<A: RoleHook, B: RoleHook> {
    first:  A,
    second: B,
}

impl<A: RoleHook, B: RoleHook> RoleHook for ChainedHook<A, B> {
    fn before_role_on(&self, resource: ResourceId, role: ResourceTypeId, tick: Tick) -> u64 {
        self.first
            .before_role_on(resource, role, tick)
            .saturating_add(self.second.before_role_on(resource, role, tick))
    }

    fn after_role_on(&self, resource: ResourceId, role: ResourceTypeId, tick: Tick) {
        self.first.after_role_on(resource, role, tick);
        self.second.after_role_on(resource, role, tick);
    }

    fn before_role_off(&self, resource: ResourceId, role: ResourceTypeId, tick: Tick) -> u64 {
        self.first
            .before_role_off(resource, role, tick)
            .saturating_add(self.second.before_role_off(resource, role, tick))
    }

    fn after_role_off(&self, resource: ResourceId, role: ResourceTypeId, tick: Tick) {
        self.first.after_role_off(resource, role, tick);
        self.second.after_role_off(resource, role, tick);
    }
}

/// Extension trait that adds `.then(other)` to any `RoleHook`.
pub trait RoleHookExt: RoleHook + Sized {
    fn then<B: RoleHook>(self, other: B) -> ChainedHook<Self, B> {
        ChainedHook { first: self, second: other }
    }
}

impl<H: RoleHook + Sized> RoleHookExt for H {}
