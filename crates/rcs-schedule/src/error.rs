use rcs_core::Tick;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("causality violation: event at {event_tick} scheduled while queue is at {now}")]
    Causality { event_tick: Tick, now: Tick },

    #[error("invalid cycle: {0}")]
    InvalidCycle(String),

    #[error("cycle position has {got} levels, cycle has {expected}")]
    PositionMismatch { expected: usize, got: usize },
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
