use rcs_core::{CoreError, ResourceId, ResourceTypeId};
use rcs_schedule::ScheduleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource {0} not found")]
    ResourceNotFound(ResourceId),

    #[error("resource type {0} not found")]
    TypeNotFound(ResourceTypeId),

    #[error("too many {0} for the id space")]
    Capacity(&'static str),

    #[error("invalid timetable cycle on {resource}: {source}")]
    Cycle {
        resource: ResourceId,
        #[source]
        source:   ScheduleError,
    },

    #[error("invalid timetable duration on {resource}: {source}")]
    Duration {
        resource: ResourceId,
        #[source]
        source:   CoreError,
    },
}

pub type ResourceResult<T> = Result<T, ResourceError>;
