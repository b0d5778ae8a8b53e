//! Work groups: the resource combinations an activity can be carried out with.

use std::fmt;

use rcs_core::{ElementId, ResourceTypeId, Tick, TimeFunction, WorkGroupId};

/// An immutable multiset of resource types: "1 Surgeon, 2 Nurse, 1 OR".
///
/// Needs are kept sorted by type with duplicates merged and zero counts
/// dropped, so two work groups with the same needs compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkGroup {
    needs: Vec<(ResourceTypeId, u32)>,
}

impl WorkGroup {
    pub fn new(needs: impl IntoIterator<Item = (ResourceTypeId, u32)>) -> Self {
        let mut merged: Vec<(ResourceTypeId, u32)> = Vec::new();
        for (rtype, count) in needs {
            match merged.iter_mut().find(|(t, _)| *t == rtype) {
                Some((_, c)) => *c = c.saturating_add(count),
                None => merged.push((rtype, count)),
            }
        }
        merged.retain(|&(_, c)| c > 0);
        merged.sort_unstable_by_key(|&(t, _)| t);
        Self { needs: merged }
    }

    /// A work group that needs no resources at all.
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn needs(&self) -> &[(ResourceTypeId, u32)] {
        &self.needs
    }

    pub fn is_empty(&self) -> bool {
        self.needs.is_empty()
    }

    /// Total number of resources required.
    pub fn size(&self) -> u32 {
        self.needs.iter().map(|&(_, c)| c).sum()
    }

    pub fn types(&self) -> impl Iterator<Item = ResourceTypeId> + '_ {
        self.needs.iter().map(|&(t, _)| t)
    }
}

// ── Admission condition ───────────────────────────────────────────────────────

/// Extra admission rule for one work group ("only on weekdays", "only for
/// urgent patients").  Evaluated before the resource search.
pub trait Condition: Send + Sync {
    fn admits(&self, element: ElementId, now: Tick) -> bool;
}

impl<F> Condition for F
where
    F: Fn(ElementId, Tick) -> bool + Send + Sync,
{
    fn admits(&self, element: ElementId, now: Tick) -> bool {
        self(element, now)
    }
}

// ── ActivityWorkGroup ─────────────────────────────────────────────────────────

/// A work group bound to an activity.
pub struct ActivityWorkGroup {
    /// Insertion index within the owning activity.
    pub id:         WorkGroupId,
    /// Higher is tried first.
    pub priority:   i32,
    pub work_group: WorkGroup,
    pub duration:   TimeFunction,
    pub condition:  Option<Box<dyn Condition>>,
}

impl ActivityWorkGroup {
    pub fn admits(&self, element: ElementId, now: Tick) -> bool {
        self.condition.as_ref().is_none_or(|c| c.admits(element, now))
    }
}

impl fmt::Debug for ActivityWorkGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityWorkGroup")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("work_group", &self.work_group)
            .field("duration", &self.duration)
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}
