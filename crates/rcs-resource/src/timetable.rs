//! Timetable and cancellation entries of a resource.
//!
//! ```text
//! TimetableEntry { cycle: Periodic(start=480, period=1440), duration: 480, role: Surgeon }
//!   → Surgeon from 08:00 to 16:00 every day
//!
//! CancelEntry { cycle: Table([2880]), duration: 1440 }
//!   → unavailable for every role during day 3
//! ```
//!
//! Cycle offsets are relative to the simulation start tick.

use rcs_core::{ResourceTypeId, TimeFunction};
use rcs_schedule::Cycle;

/// "Play `role` for `duration` ticks at every occurrence of `cycle`."
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimetableEntry {
    pub cycle:    Cycle,
    pub duration: TimeFunction,
    pub role:     ResourceTypeId,
}

/// "Be unavailable for `duration` ticks at every occurrence of `cycle`."
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CancelEntry {
    pub cycle:    Cycle,
    pub duration: TimeFunction,
}
