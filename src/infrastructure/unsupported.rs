use crate::domain::{AlertConfig, DismissalPolicy};
use crate::infrastructure::{Availability, HostError, HostHandle, LiveActivityHost};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Host implementation for platforms with no live-activity subsystem.
///
/// Reports `Unavailable` and fails every operation with
/// [`HostError::Unsupported`]. It never fabricates a handle or a success:
/// capability reporting and operation results stay consistent, so a caller
/// that skips the probe still gets an honest failure instead of a silent
/// no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedHost;

impl UnsupportedHost {
    pub fn new() -> Self {
        UnsupportedHost
    }
}

#[async_trait]
impl LiveActivityHost for UnsupportedHost {
    fn availability(&self) -> Availability {
        Availability::Unavailable
    }

    async fn materialize(
        &self,
        activity_type: &str,
        _attributes: &serde_json::Value,
        _content_state: &serde_json::Value,
    ) -> Result<HostHandle, HostError> {
        tracing::debug!(
            "Refusing to materialize '{}': no live-activity subsystem",
            activity_type
        );
        Err(HostError::Unsupported)
    }

    async fn apply_update(
        &self,
        _handle: &HostHandle,
        _content_state: &serde_json::Value,
        _alert: Option<&AlertConfig>,
        _stale_date: Option<DateTime<Utc>>,
    ) -> Result<(), HostError> {
        Err(HostError::Unsupported)
    }

    async fn teardown(
        &self,
        _handle: &HostHandle,
        _policy: &DismissalPolicy,
    ) -> Result<(), HostError> {
        Err(HostError::Unsupported)
    }
}
