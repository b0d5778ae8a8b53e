//! `TimeFunction` — a (possibly random) duration in ticks.
//!
//! Cycle periods, timetable durations, and activity durations are all
//! expressed as time functions.  Sampling always goes through a caller-owned
//! [`SimRng`] so the function itself is immutable and shareable.

use crate::{CoreError, CoreResult, SimRng};

/// A duration generator, in ticks.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeFunction {
    /// Always the same value.
    Constant(u64),
    /// Uniform over the inclusive range `[min, max]`.
    Uniform { min: u64, max: u64 },
    /// Exponential with the given mean, rounded to the nearest tick.
    Exponential { mean: f64 },
}

impl TimeFunction {
    /// Draw one value.  Deterministic functions never touch `rng`.
    pub fn sample(&self, rng: &mut SimRng) -> u64 {
        match *self {
            TimeFunction::Constant(v) => v,
            TimeFunction::Uniform { min, max } => {
                if min >= max {
                    min
                } else {
                    rng.gen_range(min..=max)
                }
            }
            TimeFunction::Exponential { mean } => {
                // Inverse transform: 1 - u is in (0, 1], so ln never sees 0.
                let u: f64 = rng.random();
                let v = -mean * (1.0 - u).ln();
                v.round().max(0.0) as u64
            }
        }
    }

    /// `true` if every sample yields the same value.
    pub fn is_constant(&self) -> bool {
        match *self {
            TimeFunction::Constant(_) => true,
            TimeFunction::Uniform { min, max } => min >= max,
            TimeFunction::Exponential { .. } => false,
        }
    }

    /// Reject parameterizations that cannot be sampled.
    pub fn validate(&self) -> CoreResult<()> {
        match *self {
            TimeFunction::Constant(_) => Ok(()),
            TimeFunction::Uniform { min, max } if min > max => Err(CoreError::Config(format!(
                "uniform time function has min {min} > max {max}"
            ))),
            TimeFunction::Uniform { .. } => Ok(()),
            TimeFunction::Exponential { mean } if !(mean.is_finite() && mean >= 0.0) => Err(
                CoreError::Config(format!("exponential time function has invalid mean {mean}")),
            ),
            TimeFunction::Exponential { .. } => Ok(()),
        }
    }
}

impl From<u64> for TimeFunction {
    fn from(v: u64) -> Self {
        TimeFunction::Constant(v)
    }
}
