//! `Activity` — a named task with alternative work groups.

use std::sync::atomic::{AtomicBool, Ordering};

use rcs_core::{ActivityId, ResourceTypeId, TimeFunction, WorkGroupId};

use crate::{ActivityError, ActivityResult, ActivityWorkGroup, Condition, WorkGroup};

/// An activity definition.
///
/// Work groups are kept sorted by priority, highest first; equal priorities
/// keep insertion order.  `id` is assigned when the activity is registered
/// with the engine.
#[derive(Debug)]
pub struct Activity {
    pub id:            ActivityId,
    pub description:   String,
    /// Higher-priority activities are re-evaluated first when resources free up.
    pub priority:      i32,
    /// Interrupted, rather than timed out, when a held role expires.
    pub interruptible: bool,
    work_groups:       Vec<ActivityWorkGroup>,
    feasible:          AtomicBool,
}

impl Activity {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id:            ActivityId::INVALID,
            description:   description.into(),
            priority:      0,
            interruptible: false,
            work_groups:   Vec::new(),
            feasible:      AtomicBool::new(true),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn interruptible(mut self) -> Self {
        self.interruptible = true;
        self
    }

    /// Add an alternative work group.
    pub fn with_work_group(self, priority: i32, work_group: WorkGroup, duration: TimeFunction) -> Self {
        self.push_work_group(priority, work_group, duration, None)
    }

    /// Add an alternative work group guarded by an admission condition.
    pub fn with_conditional_work_group(
        self,
        priority: i32,
        work_group: WorkGroup,
        duration: TimeFunction,
        condition: impl Condition + 'static,
    ) -> Self {
        self.push_work_group(priority, work_group, duration, Some(Box::new(condition)))
    }

    fn push_work_group(
        mut self,
        priority: i32,
        work_group: WorkGroup,
        duration: TimeFunction,
        condition: Option<Box<dyn Condition>>,
    ) -> Self {
        let id = WorkGroupId::try_from(self.work_groups.len()).unwrap_or(WorkGroupId::INVALID);
        self.work_groups.push(ActivityWorkGroup { id, priority, work_group, duration, condition });
        // Stable sort keeps insertion order among equal priorities.
        self.work_groups.sort_by(|a, b| b.priority.cmp(&a.priority));
        self
    }

    /// Work groups in the order the matcher tries them.
    #[inline]
    pub fn work_groups(&self) -> &[ActivityWorkGroup] {
        &self.work_groups
    }

    pub fn work_group(&self, id: WorkGroupId) -> Option<&ActivityWorkGroup> {
        self.work_groups.iter().find(|wg| wg.id == id)
    }

    /// Every resource type any work group needs, sorted and deduplicated.
    pub fn types(&self) -> Vec<ResourceTypeId> {
        let mut out: Vec<ResourceTypeId> =
            self.work_groups.iter().flat_map(|wg| wg.work_group.types()).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// `false` after an exhaustive search found nothing and no relevant
    /// resource has changed state since.
    pub fn is_potentially_feasible(&self) -> bool {
        self.feasible.load(Ordering::Relaxed)
    }

    pub fn mark_infeasible(&self) {
        self.feasible.store(false, Ordering::Relaxed);
    }

    /// A resource this activity depends on changed state; search again.
    pub fn reset_feasible(&self) {
        self.feasible.store(true, Ordering::Relaxed);
    }

    /// Check the definition against a model with `num_types` resource types.
    pub fn validate(&self, num_types: usize) -> ActivityResult<()> {
        if self.work_groups.is_empty() {
            return Err(ActivityError::NoWorkGroups { activity: self.id });
        }
        for wg in &self.work_groups {
            if wg.id == WorkGroupId::INVALID {
                return Err(ActivityError::Capacity(self.id));
            }
            if let Some(rtype) = wg.work_group.types().find(|t| t.index() >= num_types) {
                return Err(ActivityError::UnknownType { activity: self.id, rtype });
            }
            wg.duration
                .validate()
                .map_err(|source| ActivityError::Duration { activity: self.id, source })?;
        }
        Ok(())
    }
}
