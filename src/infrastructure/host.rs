use crate::domain::{AlertConfig, DismissalPolicy};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a surface materialized by the host platform.
///
/// Only a host implementation may mint these; the engine just stores and
/// echoes them back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostHandle(String);

impl HostHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        HostHandle(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the host can currently display live activities.
///
/// `Unavailable` and `Disabled` are distinct reasons that collapse to the
/// same answer for callers of the capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    /// The host has no live-activity subsystem at all
    Unavailable,
    /// The subsystem exists but the user/host has switched it off
    Disabled,
    /// Activities can be displayed
    Enabled,
}

impl Availability {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Availability::Enabled)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Unavailable => write!(f, "unavailable"),
            Availability::Disabled => write!(f, "disabled"),
            Availability::Enabled => write!(f, "enabled"),
        }
    }
}

/// Errors surfaced by a host implementation
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum HostError {
    #[error("live activities are not available on this host")]
    Unsupported,

    #[error("host rejected the request: {0}")]
    Rejected(String),
}

/// Asynchronous notifications pushed from the host back into the engine.
///
/// Delivered over the channel handed to the host at construction; arrival
/// timing is host-controlled and unbounded.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The push-registration subsystem issued a token for a surface
    PushTokenIssued { handle: HostHandle, token: String },

    /// A deferred teardown completed; the surface is gone
    TeardownConfirmed { handle: HostHandle },
}

/// External collaborator: the host platform's live-activity subsystem.
///
/// One implementation talks to a real subsystem; hosts without one use
/// [`UnsupportedHost`](crate::infrastructure::UnsupportedHost), which fails
/// every operation rather than faking success. Trait object so the engine
/// is generic over hosts, and tests can substitute their own.
#[async_trait]
pub trait LiveActivityHost: Send + Sync {
    /// Current capability state. Pure query, never fails.
    fn availability(&self) -> Availability;

    /// Create the external surface. Must never synthesize a handle on
    /// failure.
    async fn materialize(
        &self,
        activity_type: &str,
        attributes: &serde_json::Value,
        content_state: &serde_json::Value,
    ) -> Result<HostHandle, HostError>;

    /// Push new content to an existing surface, optionally alerting
    async fn apply_update(
        &self,
        handle: &HostHandle,
        content_state: &serde_json::Value,
        alert: Option<&AlertConfig>,
        stale_date: Option<DateTime<Utc>>,
    ) -> Result<(), HostError>;

    /// Request removal of a surface under the given dismissal policy.
    /// Not cancellable once issued.
    async fn teardown(
        &self,
        handle: &HostHandle,
        policy: &DismissalPolicy,
    ) -> Result<(), HostError>;
}
