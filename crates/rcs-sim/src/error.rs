use rcs_activity::ActivityError;
use rcs_conflict::ConflictError;
use rcs_core::{ActivityId, CoreError, WorkItemId};
use rcs_resource::ResourceError;
use rcs_schedule::ScheduleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{activity} needs resource types from more than one scheduling group")]
    ActivitySpansGroups { activity: ActivityId },

    #[error("activity {0} not found")]
    UnknownActivity(ActivityId),

    #[error("work item {0} not found")]
    UnknownItem(WorkItemId),

    #[error("work item {0} is not running")]
    NotRunning(WorkItemId),

    #[error("snapshot does not match the model: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Activity(#[from] ActivityError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type SimResult<T> = Result<T, SimError>;
