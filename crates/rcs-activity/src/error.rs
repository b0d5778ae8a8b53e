use rcs_core::{ActivityId, CoreError, ResourceTypeId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("{activity} has no work groups")]
    NoWorkGroups { activity: ActivityId },

    #[error("{activity} needs unknown resource type {rtype}")]
    UnknownType { activity: ActivityId, rtype: ResourceTypeId },

    #[error("invalid duration on {activity}: {source}")]
    Duration {
        activity: ActivityId,
        #[source]
        source:   CoreError,
    },

    #[error("too many work groups on {0}")]
    Capacity(ActivityId),
}

pub type ActivityResult<T> = Result<T, ActivityError>;
