mod delivery;
mod timer;

pub use delivery::{DeliveryAttributes, DeliveryState, DeliveryStatus, DeliveryTracking};
pub use timer::{CountdownTimer, TimerAttributes, TimerState};
