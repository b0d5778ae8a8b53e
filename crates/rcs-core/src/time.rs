//! Simulation time model.
//!
//! # Design
//!
//! Time is an integer `Tick` counter.  The engine jumps from one event
//! timestamp to the next, so ticks are never iterated one by one; the tick
//! only fixes the resolution of every timestamp and duration in the model.
//! `SimClock` holds the current timestamp and refuses to move backwards.
//!
//! The default tick duration is 60 s (1 simulated minute), the usual
//! granularity of staff timetables.  Only the `Display` impl uses it.

use std::fmt;

use crate::{CoreError, CoreResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation timestamp.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);
    pub const MAX: Tick = Tick(u64::MAX);

    /// Return the tick `n` steps after `self`, saturating at `Tick::MAX`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0.saturating_add(n))
    }

    /// Ticks elapsed from `earlier` to `self`, or 0 if `earlier` is later.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        self.offset(rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.since(rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The global simulation clock.
///
/// `advance_to` is the only way to move it, and it enforces causality: the
/// clock never goes backwards.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// How many real seconds one tick represents.  Default: 60.
    pub tick_duration_secs: u32,
    /// The timestamp of the event currently being executed.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(start: Tick, tick_duration_secs: u32) -> Self {
        Self { tick_duration_secs, current_tick: start }
    }

    /// Move the clock to `tick`.
    ///
    /// Returns [`CoreError::Causality`] if `tick` is before the current time.
    /// Advancing to the current tick is a no-op.
    pub fn advance_to(&mut self, tick: Tick) -> CoreResult<()> {
        if tick < self.current_tick {
            return Err(CoreError::Causality { event_tick: tick, now: self.current_tick });
        }
        self.current_tick = tick;
        Ok(())
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> u64 {
        self.current_tick.0 * self.tick_duration_secs as u64
    }

    /// Break elapsed time into (day, hour, minute) components.
    pub fn elapsed_dhm(&self) -> (u64, u32, u32) {
        let total_secs = self.elapsed_secs();
        let days = total_secs / 86_400;
        let hours = ((total_secs % 86_400) / 3_600) as u32;
        let minutes = ((total_secs % 3_600) / 60) as u32;
        (days, hours, minutes)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, h, m) = self.elapsed_dhm();
        write!(f, "{} (day {} {:02}:{:02})", self.current_tick, d, h, m)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a TOML file (see `rcs_sim::config`) and passed to
/// the engine builder.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// First timestamp of the run.  Timetable cycles start here.
    pub start_tick: Tick,

    /// End of the run (exclusive).  No event at or after it is executed.
    pub end_tick: Tick,

    /// Master RNG seed.  The same seed always produces identical results
    /// under the sequential strategy.
    pub seed: u64,

    /// Worker thread count for the partitioned strategy.  `None` uses all
    /// logical cores.
    pub num_threads: Option<usize>,

    /// Seconds per tick, used only for human-readable clock output.
    pub tick_duration_secs: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_tick:         Tick::ZERO,
            end_tick:           Tick(1_440),
            seed:               0,
            num_threads:        None,
            tick_duration_secs: 60,
        }
    }
}

impl SimConfig {
    /// Check the invariants every consumer relies on.
    pub fn validate(&self) -> CoreResult<()> {
        if self.start_tick >= self.end_tick {
            return Err(CoreError::Config(format!(
                "start_tick {} must be before end_tick {}",
                self.start_tick, self.end_tick
            )));
        }
        if self.tick_duration_secs == 0 {
            return Err(CoreError::Config("tick_duration_secs must be > 0".into()));
        }
        if self.num_threads == Some(0) {
            return Err(CoreError::Config("num_threads must be > 0 when set".into()));
        }
        Ok(())
    }

    /// Construct a `SimClock` positioned at `start_tick`.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_tick, self.tick_duration_secs)
    }
}
