//! `EventQueue` — the future-event list of one scheduling group.
//!
//! # Ordering
//!
//! Events are keyed by `(tick, priority, seq)`:
//!
//! - `tick` — when the event fires.
//! - `priority` — tie-break among events at the same tick; lower first.
//!   The engine uses it to retire availability before granting new
//!   availability, and to settle releases before new requests.
//! - `seq` — insertion counter, so equal `(tick, priority)` pairs run FIFO.
//!
//! # Causality
//!
//! The queue remembers the timestamp of the last event it handed out.
//! Pushing anything earlier than that fails with
//! [`ScheduleError::Causality`]; events at the current tick are allowed and
//! are returned before the queue advances.
//!
//! # Performance note
//!
//! `BTreeMap` gives O(log E) insert and O(log E) pop where E = pending
//! events.  Resource timetables only keep one pending event per timetable
//! entry, so E stays proportional to model size, not to simulated time.

use std::collections::BTreeMap;

use rcs_core::Tick;

use crate::{ScheduleError, ScheduleResult};

/// Total order of pending events.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EventKey {
    pub tick:     Tick,
    pub priority: u8,
    pub seq:      u64,
}

/// A priority queue of future events with a forward-only local clock.
#[derive(Debug)]
pub struct EventQueue<E> {
    inner: BTreeMap<EventKey, E>,
    seq:   u64,
    now:   Tick,
}

impl<E> EventQueue<E> {
    /// An empty queue whose clock starts at `start`.
    pub fn new(start: Tick) -> Self {
        Self { inner: BTreeMap::new(), seq: 0, now: start }
    }

    /// Schedule `event` at `tick`.
    ///
    /// Fails if `tick` is before the queue's current time.
    pub fn push(&mut self, tick: Tick, priority: u8, event: E) -> ScheduleResult<EventKey> {
        if tick < self.now {
            return Err(ScheduleError::Causality { event_tick: tick, now: self.now });
        }
        let key = EventKey { tick, priority, seq: self.seq };
        self.seq += 1;
        self.inner.insert(key, event);
        Ok(key)
    }

    /// Remove and return the earliest event, advancing the local clock to it.
    pub fn pop(&mut self) -> Option<(EventKey, E)> {
        let (key, event) = self.inner.pop_first()?;
        self.now = key.tick;
        Some((key, event))
    }

    /// Remove and return the earliest event only if it fires at `tick`.
    ///
    /// Call repeatedly to drain a timestamp; events pushed at `tick` while
    /// draining are returned in key order too.
    pub fn pop_at(&mut self, tick: Tick) -> Option<(EventKey, E)> {
        let first = self.inner.first_key_value()?.0.tick;
        if first != tick {
            return None;
        }
        self.pop()
    }

    /// The earliest tick with at least one queued event, or `None` if empty.
    pub fn next_tick(&self) -> Option<Tick> {
        self.inner.keys().next().map(|k| k.tick)
    }

    /// The timestamp of the last event handed out (or the start tick).
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Move the local clock forward without popping anything.
    ///
    /// Used when another group's events advance the global clock past this
    /// queue's last event.
    pub fn advance_to(&mut self, tick: Tick) -> ScheduleResult<()> {
        if tick < self.now {
            return Err(ScheduleError::Causality { event_tick: tick, now: self.now });
        }
        if let Some(first) = self.next_tick() {
            if first < tick {
                return Err(ScheduleError::Causality { event_tick: first, now: tick });
            }
        }
        self.now = tick;
        Ok(())
    }

    /// Drop every pending event for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(&EventKey, &E) -> bool) {
        self.inner.retain(|k, e| keep(k, e));
    }

    /// Pending events in firing order.
    pub fn iter(&self) -> impl Iterator<Item = (&EventKey, &E)> {
        self.inner.iter()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
