use crate::domain::{ActivityId, RegistryError};
use crate::infrastructure::HostError;

/// Errors surfaced by lifecycle operations
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ActivityError {
    /// The host has no live-activity subsystem, or it is disabled
    #[error("live activities are not supported on this host")]
    Unsupported,

    #[error("Activity not found: {0}")]
    NotFound(ActivityId),

    /// Internal invariant violation; cannot occur with generated ids
    #[error("Activity already exists: {0}")]
    DuplicateId(ActivityId),

    /// The host collaborator rejected the request
    #[error("External failure: {0}")]
    ExternalFailure(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<RegistryError> for ActivityError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => ActivityError::NotFound(id),
            RegistryError::DuplicateId(id) => ActivityError::DuplicateId(id),
        }
    }
}

impl From<HostError> for ActivityError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Unsupported => ActivityError::Unsupported,
            HostError::Rejected(reason) => ActivityError::ExternalFailure(reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, ActivityError>;
