mod host;
mod in_memory;
mod unsupported;

pub use host::{Availability, HostError, HostEvent, HostHandle, LiveActivityHost};
pub use in_memory::InMemoryHost;
pub use unsupported::UnsupportedHost;
