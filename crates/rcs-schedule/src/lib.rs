//! `rcs-schedule` — recurring timestamps and the future-event list.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                    |
//! |-----------------|-------------------------------------------------------------|
//! | [`cycle`]       | `Cycle`, `CycleEnd`, `Rounding`, `CycleIterator`, positions |
//! | [`event_queue`] | `EventQueue<E>` (`BTreeMap<(Tick, priority, seq), E>`)      |
//! | [`error`]       | `ScheduleError`, `ScheduleResult<T>`                        |
//!
//! # Cycle model (summary)
//!
//! ```text
//! Periodic(start=0, period=10, end=At(35))        → 0, 10, 20, 30
//! Table([5, 10, 25], end=At(20))                  → 5, 10
//! Periodic(start=0, period=7).rounded(5, Ceil)    → 0, 10, 15, …
//! ```
//!
//! Resource timetables hold one `CycleIterator` per entry; each role
//! activation pulls the next timestamp and pushes one event into the owning
//! group's `EventQueue`.

pub mod cycle;
pub mod error;
pub mod event_queue;


pub use cycle::{
    Cycle, CycleEnd, CycleIterator, CyclePosition, LevelPosition, RoundMode, Rounding,
};
pub use error::{ScheduleError, ScheduleResult};
pub use event_queue::{EventKey, EventQueue};
