//! `rcs-conflict` — sharing resources between scheduling groups safely.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                        |
//! |-----------|-----------------------------------------------------------------|
//! | [`zone`]  | `ConflictZones` registry, `ConflictZone`                        |
//! | [`catch`] | `catch`, `check_caught_resources`, `release` (ordered locking)  |
//! | [`error`] | `ConflictError`, `ConflictResult<T>`                            |
//!
//! # Protocol
//!
//! ```text
//! match found ──▶ book shared resources ──▶ lock zone semaphores ascending
//!                 (zones may merge)         ──▶ check_caught_resources
//!                                               ├─ ok   → commit holders, unlock
//!                                               └─ fail → unlock, unbook, re-queue
//! finish ──▶ release holders ──▶ unbook (empty zones are discarded)
//! ```
//!
//! Every path that holds more than one resource lock takes them in
//! ascending `ResourceId` order, so no two catches can wait on each other
//! in a cycle.  The registry's own lock is never held while waiting for a
//! resource lock.

pub mod catch;
pub mod error;
pub mod zone;


pub use catch::{catch, check_caught_resources, lock_in_order, release, CatchOutcome};
pub use error::{ConflictError, ConflictResult};
pub use zone::{ConflictZone, ConflictZones};
