//! `Resource` — a staff member, machine, or room — and its mutable state.
//!
//! The definition (`timetable`, `cancellations`) is immutable once the store
//! is built.  Everything that changes during a run lives in
//! [`ResourceState`] behind the resource's own `Mutex`, which doubles as the
//! resource's semaphore in the conflict-zone catch protocol.
//!
//! # Locking order
//!
//! Any code path holding more than one resource lock must acquire them in
//! ascending `ResourceId` order.  Single-lock paths (role events, releases)
//! never wait on a second lock while holding the first.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rcs_core::{ResourceId, ResourceTypeId, Tick, WorkItemId};

use crate::timetable::{CancelEntry, TimetableEntry};

// ── Definition ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Resource {
    pub id:            ResourceId,
    pub description:   String,
    pub timetable:     Vec<TimetableEntry>,
    pub cancellations: Vec<CancelEntry>,
    state:             Mutex<ResourceState>,
}

impl Resource {
    pub fn new(id: ResourceId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            timetable: Vec::new(),
            cancellations: Vec::new(),
            state: Mutex::new(ResourceState::default()),
        }
    }

    /// Lock the mutable state.
    ///
    /// A panic on another thread while holding the lock does not corrupt
    /// the state (every mutation is a single assignment or push), so a
    /// poisoned lock is recovered rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, ResourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Distinct roles this resource can play, in timetable order.
    pub fn roles(&self) -> Vec<ResourceTypeId> {
        let mut out: Vec<ResourceTypeId> = Vec::with_capacity(self.timetable.len());
        for entry in &self.timetable {
            if !out.contains(&entry.role) {
                out.push(entry.role);
            }
        }
        out
    }

    /// The role of the first timetable entry, if any.
    pub fn primary_role(&self) -> Option<ResourceTypeId> {
        self.timetable.first().map(|e| e.role)
    }

    /// Shorthand for `lock().is_available(role, now)`.
    pub fn is_available(&self, role: ResourceTypeId, now: Tick) -> bool {
        self.lock().is_available(role, now)
    }
}

// ── Mutable state ─────────────────────────────────────────────────────────────

/// A role the resource is currently playing.
///
/// `count` tracks overlapping activations of the same role from different
/// timetable entries; the role stays active until every one has turned off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveRole {
    pub role:  ResourceTypeId,
    pub until: Tick,
    pub count: u32,
}

/// The work item currently holding the resource, and the role it holds it as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Holder {
    pub item: WorkItemId,
    pub role: ResourceTypeId,
}

/// What happened when a role turned off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleOffOutcome {
    /// The role is still active through another timetable entry.
    pub still_active: bool,
    /// The current holder was using the role that just expired.
    pub holder_timed_out: Option<Holder>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceState {
    pub roles:         Vec<ActiveRole>,
    /// Nesting depth of active cancellations.
    pub cancelled:     u32,
    pub holder:        Option<Holder>,
    /// The holder's role expired while it held the resource.  Cleared by the
    /// next role activation.
    pub timed_out:     bool,
    /// Timetable entries that still have future occurrences.
    pub valid_entries: u32,
    pub ended:         bool,
}

impl ResourceState {
    /// `role` active and unexpired, not cancelled, not timed out, no holder.
    pub fn is_available(&self, role: ResourceTypeId, now: Tick) -> bool {
        self.cancelled == 0
            && !self.timed_out
            && self.holder.is_none()
            && self.roles.iter().any(|r| r.role == role && r.until > now)
    }

    pub fn is_active(&self, role: ResourceTypeId) -> bool {
        self.roles.iter().any(|r| r.role == role)
    }

    /// Start playing `role` until `until`.  Returns `true` if the role was
    /// not active before.
    pub fn role_on(&mut self, role: ResourceTypeId, until: Tick) -> bool {
        self.timed_out = false;
        match self.roles.iter_mut().find(|r| r.role == role) {
            Some(active) => {
                active.count += 1;
                active.until = active.until.max(until);
                false
            }
            None => {
                self.roles.push(ActiveRole { role, until, count: 1 });
                true
            }
        }
    }

    /// Push the expiry of an active `role` out to at least `until`.
    pub fn extend_role(&mut self, role: ResourceTypeId, until: Tick) {
        if let Some(active) = self.roles.iter_mut().find(|r| r.role == role) {
            active.until = active.until.max(until);
        }
    }

    /// Stop one activation of `role`.
    pub fn role_off(&mut self, role: ResourceTypeId) -> RoleOffOutcome {
        let Some(pos) = self.roles.iter().position(|r| r.role == role) else {
            return RoleOffOutcome { still_active: false, holder_timed_out: None };
        };
        let active = &mut self.roles[pos];
        active.count = active.count.saturating_sub(1);
        if active.count > 0 {
            return RoleOffOutcome { still_active: true, holder_timed_out: None };
        }
        self.roles.remove(pos);

        let holder_timed_out = self.holder.filter(|h| h.role == role);
        if holder_timed_out.is_some() {
            self.timed_out = true;
        }
        RoleOffOutcome { still_active: false, holder_timed_out }
    }

    pub fn cancel_on(&mut self) {
        self.cancelled += 1;
    }

    pub fn cancel_off(&mut self) {
        self.cancelled = self.cancelled.saturating_sub(1);
    }

    /// Take the resource for `item` acting as `role`.  Fails if someone
    /// else holds it.
    pub fn catch(&mut self, item: WorkItemId, role: ResourceTypeId) -> bool {
        if self.holder.is_some() {
            return false;
        }
        self.holder = Some(Holder { item, role });
        true
    }

    /// Give the resource back.  Returns the holder if it was `item`.
    ///
    /// A timed-out resource stays timed out; it rejoins the pool at its
    /// next role activation.
    pub fn release(&mut self, item: WorkItemId) -> Option<Holder> {
        match self.holder {
            Some(h) if h.item == item => self.holder.take(),
            _ => None,
        }
    }

    /// One timetable entry has no further occurrences.  Returns `true` when
    /// that was the last one and the resource has now ended.
    pub fn entry_exhausted(&mut self) -> bool {
        self.valid_entries = self.valid_entries.saturating_sub(1);
        if self.valid_entries == 0 && !self.ended {
            self.ended = true;
            return true;
        }
        false
    }

    /// Ticks left before `role` expires, or `None` if it is not active.
    pub fn remaining(&self, role: ResourceTypeId, now: Tick) -> Option<u64> {
        self.roles.iter().find(|r| r.role == role).map(|r| r.until - now)
    }
}
