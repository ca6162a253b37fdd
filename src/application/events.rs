use crate::domain::ActivityId;

/// Notifications emitted by the engine after each lifecycle transition.
///
/// Drained by the caller (typically a UI bridge layer); the engine never
/// blocks on consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    /// Host materialized the surface; the activity is Active
    Started { id: ActivityId },

    /// Content state was replaced
    Updated { id: ActivityId },

    /// End accepted with a deferred dismissal; surface still visible
    Ending { id: ActivityId },

    /// Surface is gone and the registry entry removed
    Ended { id: ActivityId },

    /// Host refused to materialize; nothing was registered
    StartFailed {
        activity_type: String,
        reason: String,
    },

    /// A push token arrived and was stored on the entry
    PushTokenIssued { id: ActivityId },
}
