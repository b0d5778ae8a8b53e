//! `rcs-core` — foundational types for the `rust_rcs` simulation framework.
//!
//! This crate is a dependency of every other `rcs-*` crate.  It has no
//! `rcs-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module            | Contents                                                   |
//! |-------------------|------------------------------------------------------------|
//! | [`ids`]           | `ElementId`, `ResourceId`, `ResourceTypeId`, `ActivityId`, … |
//! | [`time`]          | `Tick`, `SimClock`, `SimConfig`                            |
//! | [`rng`]           | `SimRng` (per-stream deterministic RNG)                    |
//! | [`time_function`] | `TimeFunction` — constant or random durations              |
//! | [`error`]         | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by `rcs-sim` snapshots and config loading.        |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;
pub mod time_function;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{
    ActivityId, ElementId, GroupId, ResourceId, ResourceTypeId, WorkGroupId, WorkItemId, ZoneId,
};
pub use rng::SimRng;
pub use time::{SimClock, SimConfig, Tick};
pub use time_function::TimeFunction;
