//! Scheduling strategies: how resource types are split into groups.
//!
//! ```text
//! Sequential:   [ T0 T1 T2 T3 ]                 one group, one thread
//! Partitioned:  [ T0 T1 ] [ T2 ] [ T3 ]         one queue and clock per group
//! ```
//!
//! A resource whose roles fall into different groups is *shared*; catches
//! involving it go through the conflict-zone protocol.

use rcs_core::ResourceTypeId;

use crate::{SimError, SimResult};

pub trait SchedulingStrategy {
    /// Partition `0..num_types` into scheduling groups.  Group order is the
    /// order in which results are merged, so it must be deterministic.
    fn groups(&self, num_types: usize) -> SimResult<Vec<Vec<ResourceTypeId>>>;

    /// Whether groups at the same tick may be processed concurrently.
    fn concurrent(&self) -> bool {
        false
    }
}

/// Every type in one group.  No resource is ever shared.
pub struct Sequential;

impl SchedulingStrategy for Sequential {
    fn groups(&self, num_types: usize) -> SimResult<Vec<Vec<ResourceTypeId>>> {
        let all = (0..num_types)
            .map(|i| {
                ResourceTypeId::try_from(i)
                    .map_err(|_| SimError::Config(format!("resource type index {i} out of range")))
            })
            .collect::<SimResult<Vec<_>>>()?;
        Ok(vec![all])
    }
}

/// A caller-supplied partition of the resource types.
pub struct Partitioned {
    pub groups: Vec<Vec<ResourceTypeId>>,
}

impl Partitioned {
    pub fn new(groups: Vec<Vec<ResourceTypeId>>) -> Self {
        Self { groups }
    }
}

impl SchedulingStrategy for Partitioned {
    fn groups(&self, num_types: usize) -> SimResult<Vec<Vec<ResourceTypeId>>> {
        let mut seen = vec![false; num_types];
        for group in &self.groups {
            if group.is_empty() {
                return Err(SimError::Config("empty scheduling group".into()));
            }
            for t in group {
                match seen.get_mut(t.index()) {
                    None => return Err(SimError::Config(format!("unknown resource type {t} in partition"))),
                    Some(true) => return Err(SimError::Config(format!("{t} appears in two groups"))),
                    Some(flag) => *flag = true,
                }
            }
        }
        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(SimError::Config(format!("resource type {missing} is in no group")));
        }
        Ok(self
            .groups
            .iter()
            .map(|g| {
                let mut g = g.clone();
                g.sort_unstable();
                g
            })
            .collect())
    }

    fn concurrent(&self) -> bool {
        true
    }
}
