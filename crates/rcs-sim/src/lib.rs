//! `rcs-sim` — event loop orchestrator for the rust_rcs framework.
//!
//! # Event loop
//!
//! ```text
//! start:  seed timetables, flow.on_start, settle
//! while next event < end_tick:
//!   ① Drain   — each group with events at the tick applies them in
//!               (tick, priority, seq) order:
//!                 RoleOff / CancelOn   (availability lost)
//!                 Finish               (resources released)
//!                 RoleOn / CancelOff   (availability gained)
//!                 Request              (scheduled arrivals)
//!               (parallel across groups with the `parallel` feature)
//!   ② Merge   — outputs in group order; gained resources wake the
//!               activities that can use them; flow sees finishes
//!   ③ Settle  — match waiting items until every group is quiet
//! ```
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`sim`]      | `Sim`, `RequestOutcome`                                    |
//! | [`builder`]  | `SimBuilder`                                               |
//! | [`strategy`] | `SchedulingStrategy`, `Sequential`, `Partitioned`          |
//! | [`observer`] | `SimEvent`, `SimObserver`, `NoopObserver`, `EventLog`      |
//! | [`snapshot`] | `SimSnapshot` and its parts                                |
//! | [`config`]   | `load_config`, `parse_config` (TOML)                       |
//! | [`event`]    | `EngineEvent`, the queued event type                       |
//! | [`error`]    | `SimError`, `SimResult<T>`                                 |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                       |
//! |------------|--------------------------------------------------------------|
//! | `parallel` | Drains and settles groups of a `Partitioned` run on Rayon.   |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rcs_activity::{Activity, NoopFlow, WorkGroup};
//! use rcs_core::{ElementId, SimConfig, TimeFunction};
//! use rcs_sim::{EventLog, SimBuilder};
//!
//! let mut sim = SimBuilder::new(config, store, activities, NoopFlow).build()?;
//! sim.request_activity(ElementId(0), ActivityId(0))?;
//! let mut log = EventLog::new();
//! sim.run(&mut log)?;
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod event;
mod group;
pub mod observer;
pub mod sim;
pub mod snapshot;
pub mod strategy;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use config::{load_config, parse_config};
pub use error::{SimError, SimResult};
pub use event::EngineEvent;
pub use observer::{EventLog, NoopObserver, SimEvent, SimObserver};
pub use sim::{RequestOutcome, Sim};
pub use snapshot::{GroupSnapshot, IteratorPosition, SimSnapshot};
pub use strategy::{Partitioned, SchedulingStrategy, Sequential};
