use crate::infrastructure::{Availability, LiveActivityHost};
use std::sync::Arc;

/// Reports whether the current host can display live activities.
///
/// Collapses the two distinct "no" reasons (subsystem absent, subsystem
/// disabled) into one boolean. Callers are expected to check this before
/// mutating, but the engine stays safe if they don't: capability reporting
/// and operation success are independent contracts.
#[derive(Clone)]
pub struct CapabilityProbe {
    host: Arc<dyn LiveActivityHost>,
}

impl CapabilityProbe {
    pub fn new(host: Arc<dyn LiveActivityHost>) -> Self {
        CapabilityProbe { host }
    }

    /// The host's full capability state
    pub fn availability(&self) -> Availability {
        self.host.availability()
    }

    /// Pure query, no side effects, never fails
    pub fn is_supported(&self) -> bool {
        self.host.availability().is_enabled()
    }
}
