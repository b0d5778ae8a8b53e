//! Cycle definitions and the lazy timestamp iterator.
//!
//! # Cycle model
//!
//! A [`Cycle`] describes the timestamps at which something recurs:
//!
//! ```text
//! Periodic { start, period, end }   origin+start, +period, +period, …
//! Table    { offsets, end }         origin+o₀, origin+o₁, …  (sorted)
//! Rounded  { inner, rounding }      every timestamp of `inner`, rounded
//! ```
//!
//! `start`, `offsets`, and `CycleEnd::At` are offsets from the *origin* the
//! iterator is started at: the simulation start for a root cycle, the
//! parent occurrence for a sub-cycle.
//!
//! A sub-cycle runs inside each occurrence of its parent and is confined to
//! that occurrence's period: the child is reset on every new parent
//! occurrence with end `min(parent period end, external end)`.  Only the
//! innermost level emits timestamps.
//!
//! ```text
//! parent  |0---------------|24--------------|48 …
//! child    8  10  12         32  34  36          (start 8, period 2, 3 iterations)
//! ```

use rcs_core::{SimRng, Tick, TimeFunction};

use crate::{ScheduleError, ScheduleResult};

// ── Definitions ───────────────────────────────────────────────────────────────

/// How a cycle level stops producing occurrences.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CycleEnd {
    /// Runs until the external bound (simulation end or parent period).
    Unbounded,
    /// Stops before `origin + offset`.
    At(u64),
    /// Produces at most this many occurrences per reset.
    Iterations(u64),
}

/// Rounding direction for [`Cycle::Rounded`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoundMode {
    /// Nearest multiple, halves rounded up.
    Round,
    Ceil,
    Floor,
}

/// Snap timestamps to `shift + k * factor`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rounding {
    pub factor: u64,
    pub shift:  u64,
    pub mode:   RoundMode,
}

impl Rounding {
    pub fn apply(&self, tick: Tick) -> Tick {
        if self.factor == 0 {
            return tick;
        }
        let f = self.factor as i128;
        let x = tick.0 as i128 - self.shift as i128;
        let q = match self.mode {
            RoundMode::Floor => x.div_euclid(f),
            RoundMode::Ceil => -((-x).div_euclid(f)),
            RoundMode::Round => (x + f / 2).div_euclid(f),
        };
        let v = q * f + self.shift as i128;
        Tick(v.clamp(0, u64::MAX as i128) as u64)
    }
}

/// A recurring-timestamp generator.  See the module docs for semantics.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cycle {
    Periodic {
        start:  u64,
        period: TimeFunction,
        end:    CycleEnd,
        sub:    Option<Box<Cycle>>,
    },
    Table {
        /// Sorted ascending (enforced by [`Cycle::table`] and [`Cycle::validate`]).
        offsets: Vec<u64>,
        end:     CycleEnd,
        sub:     Option<Box<Cycle>>,
    },
    Rounded {
        inner:    Box<Cycle>,
        rounding: Rounding,
    },
}

impl Cycle {
    /// A periodic cycle with a constant period.
    pub fn periodic(start: u64, period: u64, end: CycleEnd) -> Self {
        Cycle::periodic_random(start, TimeFunction::Constant(period), end)
    }

    /// A periodic cycle whose period is re-sampled after every occurrence.
    pub fn periodic_random(start: u64, period: TimeFunction, end: CycleEnd) -> Self {
        Cycle::Periodic { start, period, end, sub: None }
    }

    /// A table cycle; `offsets` are sorted here.
    pub fn table(mut offsets: Vec<u64>, end: CycleEnd) -> Self {
        offsets.sort_unstable();
        Cycle::Table { offsets, end, sub: None }
    }

    /// A single occurrence at `origin + at`.
    pub fn once(at: u64) -> Self {
        Cycle::table(vec![at], CycleEnd::Unbounded)
    }

    /// Nest `sub` inside every occurrence of this cycle.
    ///
    /// On a rounded cycle the sub-cycle is attached to the wrapped cycle.
    pub fn with_sub(self, sub: Cycle) -> Self {
        match self {
            Cycle::Periodic { start, period, end, .. } => {
                Cycle::Periodic { start, period, end, sub: Some(Box::new(sub)) }
            }
            Cycle::Table { offsets, end, .. } => {
                Cycle::Table { offsets, end, sub: Some(Box::new(sub)) }
            }
            Cycle::Rounded { inner, rounding } => {
                Cycle::Rounded { inner: Box::new(inner.with_sub(sub)), rounding }
            }
        }
    }

    pub fn rounded(self, factor: u64, mode: RoundMode) -> Self {
        self.rounded_with_shift(factor, 0, mode)
    }

    pub fn rounded_with_shift(self, factor: u64, shift: u64, mode: RoundMode) -> Self {
        Cycle::Rounded { inner: Box::new(self), rounding: Rounding { factor, shift, mode } }
    }

    /// Reject cycles that cannot be iterated.
    pub fn validate(&self) -> ScheduleResult<()> {
        match self {
            Cycle::Periodic { period, sub, .. } => {
                period
                    .validate()
                    .map_err(|e| ScheduleError::InvalidCycle(e.to_string()))?;
                sub.as_deref().map_or(Ok(()), Cycle::validate)
            }
            Cycle::Table { offsets, sub, .. } => {
                if offsets.windows(2).any(|w| w[0] > w[1]) {
                    return Err(ScheduleError::InvalidCycle(format!(
                        "table offsets must be sorted: {offsets:?}"
                    )));
                }
                sub.as_deref().map_or(Ok(()), Cycle::validate)
            }
            Cycle::Rounded { inner, rounding } => {
                if rounding.factor == 0 {
                    return Err(ScheduleError::InvalidCycle("rounding factor must be > 0".into()));
                }
                inner.validate()
            }
        }
    }

    /// Start iterating at `start`, never yielding anything at or after `end`.
    pub fn iter(&self, start: Tick, end: Tick, rng: SimRng) -> CycleIterator {
        CycleIterator::new(self, start, end, rng)
    }

    /// Number of nesting levels (a plain cycle has one).
    pub fn depth(&self) -> usize {
        match self {
            Cycle::Periodic { sub, .. } | Cycle::Table { sub, .. } => {
                1 + sub.as_deref().map_or(0, Cycle::depth)
            }
            Cycle::Rounded { inner, .. } => inner.depth(),
        }
    }
}

// ── Per-level iteration state ─────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum LevelKind {
    Periodic { start: u64, period: TimeFunction },
    Table { offsets: Vec<u64> },
}

#[derive(Clone, Debug)]
struct Level {
    kind:            LevelKind,
    end_mode:        CycleEnd,
    /// Outermost wrapper first.
    roundings:       Vec<Rounding>,
    origin:          Tick,
    end:             Tick,
    /// The occurrence this level will produce (leaf) or is inside (parent).
    current:         Option<Tick>,
    next:            Option<Tick>,
    /// Where `current`'s period ends; bounds the child level.
    period_end:      Tick,
    iterations_left: Option<u64>,
    table_idx:       usize,
}

impl Level {
    fn new(kind: LevelKind, end_mode: CycleEnd, roundings: Vec<Rounding>) -> Self {
        Self {
            kind,
            end_mode,
            roundings,
            origin: Tick::ZERO,
            end: Tick::ZERO,
            current: None,
            next: None,
            period_end: Tick::ZERO,
            iterations_left: None,
            table_idx: 0,
        }
    }

    fn clear(&mut self) {
        self.current = None;
        self.next = None;
    }

    fn reset(&mut self, origin: Tick, bound: Tick, rng: &mut SimRng) {
        self.origin = origin;
        self.end = match self.end_mode {
            CycleEnd::At(offset) => bound.min(origin + offset),
            _ => bound,
        };
        self.iterations_left = match self.end_mode {
            CycleEnd::Iterations(n) => Some(n),
            _ => None,
        };
        self.table_idx = 0;
        let first = match &self.kind {
            LevelKind::Periodic { start, .. } => Some(origin + *start),
            LevelKind::Table { offsets } => offsets.first().map(|o| origin + *o),
        };
        match first {
            Some(ts) if ts < self.end && self.iterations_left != Some(0) => {
                self.current = Some(ts);
                self.compute_following(rng);
            }
            _ => self.clear(),
        }
    }

    /// Derive `next` and `period_end` from `current`.
    fn compute_following(&mut self, rng: &mut SimRng) {
        let Some(current) = self.current else {
            self.next = None;
            return;
        };
        let following = match &self.kind {
            // A zero period is bumped to one tick so the iterator always progresses.
            LevelKind::Periodic { period, .. } => Some(current + period.sample(rng).max(1)),
            LevelKind::Table { offsets } => {
                offsets.get(self.table_idx + 1).map(|o| self.origin + *o)
            }
        };
        self.period_end = following.unwrap_or(self.end);
        if let Some(n) = self.iterations_left.as_mut() {
            *n = n.saturating_sub(1);
        }
        self.next = match following {
            Some(ts) if ts < self.end && self.iterations_left != Some(0) => Some(ts),
            _ => None,
        };
    }

    fn step(&mut self, rng: &mut SimRng) {
        self.current = self.next.take();
        if self.current.is_some() {
            self.table_idx += 1;
            self.compute_following(rng);
        }
    }

    fn position(&self) -> LevelPosition {
        LevelPosition {
            origin:          self.origin,
            end:             self.end,
            current:         self.current,
            next:            self.next,
            period_end:      self.period_end,
            iterations_left: self.iterations_left,
            table_idx:       self.table_idx,
        }
    }

    fn restore(&mut self, pos: &LevelPosition) {
        self.origin = pos.origin;
        self.end = pos.end;
        self.current = pos.current;
        self.next = pos.next;
        self.period_end = pos.period_end;
        self.iterations_left = pos.iterations_left;
        self.table_idx = pos.table_idx;
    }
}

/// Flatten a cycle into one `Level` per nesting depth.
fn flatten(cycle: &Cycle, levels: &mut Vec<Level>) {
    let mut roundings = Vec::new();
    let mut node = cycle;
    while let Cycle::Rounded { inner, rounding } = node {
        roundings.push(*rounding);
        node = inner;
    }
    let (kind, end, sub) = match node {
        Cycle::Periodic { start, period, end, sub } => {
            (LevelKind::Periodic { start: *start, period: period.clone() }, end, sub)
        }
        Cycle::Table { offsets, end, sub } => {
            (LevelKind::Table { offsets: offsets.clone() }, end, sub)
        }
        Cycle::Rounded { .. } => unreachable!("rounded wrappers were peeled above"),
    };
    levels.push(Level::new(kind, end.clone(), roundings));
    if let Some(sub) = sub {
        flatten(sub, levels);
    }
}

// ── Snapshot positions ────────────────────────────────────────────────────────

/// Serializable state of one iterator level.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelPosition {
    pub origin:          Tick,
    pub end:             Tick,
    pub current:         Option<Tick>,
    pub next:            Option<Tick>,
    pub period_end:      Tick,
    pub iterations_left: Option<u64>,
    pub table_idx:       usize,
}

/// Serializable state of a whole [`CycleIterator`], minus its RNG.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CyclePosition {
    pub end:    Tick,
    pub levels: Vec<LevelPosition>,
}

// ── CycleIterator ─────────────────────────────────────────────────────────────

/// Lazy, forward-only iterator over a cycle's timestamps.
///
/// Yields ascending timestamps in `[start, end)` and then `None` forever,
/// until [`reset`][Self::reset] restarts it in place.  Random periods are
/// drawn from the iterator's own RNG stream.
#[derive(Debug)]
pub struct CycleIterator {
    levels: Vec<Level>,
    end:    Tick,
    rng:    SimRng,
}

impl CycleIterator {
    pub fn new(cycle: &Cycle, start: Tick, end: Tick, rng: SimRng) -> Self {
        let mut levels = Vec::with_capacity(cycle.depth());
        flatten(cycle, &mut levels);
        let mut it = Self { levels, end, rng };
        it.reset(start, end);
        it
    }

    /// Rebuild an iterator for `cycle` at a previously captured position.
    pub fn restore(cycle: &Cycle, position: &CyclePosition, rng: SimRng) -> ScheduleResult<Self> {
        let mut levels = Vec::with_capacity(cycle.depth());
        flatten(cycle, &mut levels);
        if levels.len() != position.levels.len() {
            return Err(ScheduleError::PositionMismatch {
                expected: levels.len(),
                got:      position.levels.len(),
            });
        }
        for (level, pos) in levels.iter_mut().zip(&position.levels) {
            level.restore(pos);
        }
        Ok(Self { levels, end: position.end, rng })
    }

    /// Restart the whole iterator at `start`, bounded by `end`.
    pub fn reset(&mut self, start: Tick, end: Tick) {
        self.end = end;
        self.levels[0].reset(start, end, &mut self.rng);
        self.reseed_below(0);
    }

    /// Capture the iteration state for a snapshot.
    pub fn position(&self) -> CyclePosition {
        CyclePosition {
            end:    self.end,
            levels: self.levels.iter().map(Level::position).collect(),
        }
    }

    /// The timestamp the next call to `next()` would yield, if it is already
    /// known without advancing.
    pub fn peek(&self) -> Option<Tick> {
        let leaf = self.levels.last()?;
        leaf.current.map(|ts| self.apply_rounding(ts)).filter(|ts| *ts < self.end)
    }

    /// The external upper bound.
    pub fn end(&self) -> Tick {
        self.end
    }

    /// Reset every level below `parent` from its parent's current occurrence.
    fn reseed_below(&mut self, parent: usize) {
        for child in parent + 1..self.levels.len() {
            let (current, period_end) = {
                let p = &self.levels[child - 1];
                (p.current, p.period_end)
            };
            match current {
                Some(origin) => {
                    let bound = period_end.min(self.end);
                    self.levels[child].reset(origin, bound, &mut self.rng);
                }
                None => self.levels[child].clear(),
            }
        }
    }

    /// Apply every rounding wrapper, innermost subtree first.
    fn apply_rounding(&self, tick: Tick) -> Tick {
        self.levels
            .iter()
            .rev()
            .flat_map(|l| l.roundings.iter().rev())
            .fold(tick, |t, r| r.apply(t))
    }

    fn exhaust(&mut self) {
        for level in &mut self.levels {
            level.clear();
        }
    }
}

impl Iterator for CycleIterator {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        loop {
            let leaf = self.levels.len() - 1;
            if let Some(ts) = self.levels[leaf].current {
                self.levels[leaf].step(&mut self.rng);
                let out = self.apply_rounding(ts);
                // Rounding is monotone, so nothing later can fit either.
                if out >= self.end {
                    self.exhaust();
                    return None;
                }
                return Some(out);
            }

            // The leaf is spent: advance the nearest ancestor that still has
            // an occurrence, then restart everything below it.
            let mut level = leaf;
            loop {
                if level == 0 {
                    return None;
                }
                level -= 1;
                self.levels[level].step(&mut self.rng);
                if self.levels[level].current.is_some() {
                    break;
                }
            }
            self.reseed_below(level);
        }
    }
}
