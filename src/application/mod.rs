mod engine;
mod error;
mod events;
mod probe;

pub use engine::{EndAllReport, LiveActivityEngine, StartConfig};
pub use error::{ActivityError, Result};
pub use events::ActivityEvent;
pub use probe::CapabilityProbe;
