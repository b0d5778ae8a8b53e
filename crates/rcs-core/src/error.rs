//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

use crate::Tick;

/// The top-level error type for `rcs-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Something tried to move the clock backwards.  Always a programming
    /// error in the model; the run must abort.
    #[error("causality violation: event at {event_tick} scheduled while clock is at {now}")]
    Causality { event_tick: Tick, now: Tick },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `rcs-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;
