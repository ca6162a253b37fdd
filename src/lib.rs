pub mod activities;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod traits;

pub use application::{
    ActivityError, ActivityEvent, CapabilityProbe, EndAllReport, LiveActivityEngine, Result,
    StartConfig,
};
pub use domain::{
    Activity, ActivityId, ActivityRegistry, ActivityStatus, AlertConfig, DismissalPolicy,
    RegistryError, Timestamp,
};
pub use infrastructure::{
    Availability, HostError, HostEvent, HostHandle, InMemoryHost, LiveActivityHost,
    UnsupportedHost,
};
pub use traits::ActivityTemplate;
