use serde::Serialize;

/// Trait that consuming apps implement for their activity payloads.
///
/// Gives the engine typed start/update entry points; on the wire both
/// documents are still opaque JSON, so the host never depends on app types.
pub trait ActivityTemplate {
    /// Static attributes fixed at start time (the "shape" of the activity)
    type Attributes: Serialize;

    /// Mutable content replaced wholesale on each update
    type ContentState: Serialize;

    /// Unique type identifier (e.g., "delivery-tracking-v1")
    /// MUST be stable across versions for backwards compatibility
    fn activity_type() -> &'static str;
}
