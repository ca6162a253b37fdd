mod activity;
mod registry;

pub use activity::{
    Activity, ActivityId, ActivityStatus, AlertConfig, DismissalPolicy, Timestamp, UnknownPolicy,
};
pub use registry::{ActivityRegistry, RegistryError};
