use rcs_core::WorkItemId;
use rcs_resource::ResourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConflictError {
    #[error("{0} is not booked in any conflict zone")]
    NotBooked(WorkItemId),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

pub type ConflictResult<T> = Result<T, ConflictError>;
