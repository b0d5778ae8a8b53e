//! `rcs-resource` — resources, roles, timetables, and availability state.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                  |
//! |-------------------|-----------------------------------------------------------|
//! | [`resource_type`] | `ResourceType` — a role such as "Surgeon"                 |
//! | [`hook`]          | `RoleHook` trait, `NoHook`, `ChainedHook`                 |
//! | [`timetable`]     | `TimetableEntry`, `CancelEntry`                           |
//! | [`resource`]      | `Resource` (definition + guarded `ResourceState`)         |
//! | [`roster`]        | `Roster` — resources currently playing one role           |
//! | [`store`]         | `ResourceStore` (arena of types and resources)            |
//! | [`builder`]       | `ResourceStoreBuilder` (fluent construction)              |
//! | [`error`]         | `ResourceError`, `ResourceResult<T>`                      |
//!
//! # Availability model
//!
//! A resource is usable for role `R` at tick `t` iff:
//!
//! ```text
//! R is active with expiry > t  ∧  not cancelled  ∧  not timed out  ∧  no holder
//! ```
//!
//! Each resource's mutable state sits behind its own `Mutex`.  That mutex is
//! the resource's *semaphore*: the conflict-zone catch protocol acquires
//! several of them, always in ascending `ResourceId` order.

pub mod builder;
pub mod error;
pub mod hook;
pub mod resource;
pub mod resource_type;
pub mod roster;
pub mod store;
pub mod timetable;

#[cfg(test)]
mod tests;

pub use builder::ResourceStoreBuilder;
pub use error::{ResourceError, ResourceResult};
pub use hook::{ChainedHook, NoHook, RoleHook, RoleHookExt};
pub use resource::{ActiveRole, Holder, Resource, ResourceState, RoleOffOutcome};
pub use resource_type::ResourceType;
pub use roster::Roster;
pub use store::ResourceStore;
pub use timetable::{CancelEntry, TimetableEntry};
