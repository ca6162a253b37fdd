use crate::domain::{AlertConfig, DismissalPolicy};
use crate::infrastructure::{Availability, HostError, HostEvent, HostHandle, LiveActivityHost};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One materialized surface tracked by the simulator
#[derive(Debug, Clone)]
struct Surface {
    activity_type: String,
    content_state: serde_json::Value,
    /// Set once a deferred teardown was requested
    pending_dismissal: Option<DismissalPolicy>,
}

/// Simulated live-activity subsystem kept entirely in memory.
///
/// Stands in for a native host in tests and demos: it mints real handles,
/// enforces handle validity, and delivers push tokens and deferred teardown
/// confirmations over the host-event channel exactly like a native
/// subsystem would. Failure injection makes external rejections testable.
pub struct InMemoryHost {
    availability: Mutex<Availability>,
    surfaces: Mutex<HashMap<HostHandle, Surface>>,
    events: mpsc::UnboundedSender<HostEvent>,
    fail_next_materialize: Mutex<bool>,
    fail_teardown_for: Mutex<HashSet<HostHandle>>,
}

impl InMemoryHost {
    /// Create an enabled host plus the event receiver to hand to the engine
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        Self::with_availability(Availability::Enabled)
    }

    /// Create a host in a specific capability state (e.g. `Disabled` to
    /// model a user switch-off)
    pub fn with_availability(
        availability: Availability,
    ) -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let host = InMemoryHost {
            availability: Mutex::new(availability),
            surfaces: Mutex::new(HashMap::new()),
            events: tx,
            fail_next_materialize: Mutex::new(false),
            fail_teardown_for: Mutex::new(HashSet::new()),
        };
        (host, rx)
    }

    /// Flip the capability state at runtime (user toggles the feature)
    pub fn set_availability(&self, availability: Availability) {
        *self.availability.lock().unwrap() = availability;
    }

    /// Make the next `materialize` call fail with a rejection
    pub fn fail_next_materialize(&self) {
        *self.fail_next_materialize.lock().unwrap() = true;
    }

    /// Make `teardown` fail for a specific surface
    pub fn fail_teardown_for(&self, handle: &HostHandle) {
        self.fail_teardown_for
            .lock()
            .unwrap()
            .insert(handle.clone());
    }

    /// Simulate the push-registration subsystem issuing a token
    pub fn issue_push_token(&self, handle: &HostHandle, token: impl Into<String>) {
        let _ = self.events.send(HostEvent::PushTokenIssued {
            handle: handle.clone(),
            token: token.into(),
        });
    }

    /// Complete a deferred teardown: drop the surface and notify the engine
    pub fn confirm_teardown(&self, handle: &HostHandle) {
        self.surfaces.lock().unwrap().remove(handle);
        let _ = self.events.send(HostEvent::TeardownConfirmed {
            handle: handle.clone(),
        });
    }

    /// Number of surfaces currently on screen
    pub fn surface_count(&self) -> usize {
        self.surfaces.lock().unwrap().len()
    }

    /// Handle of the first surface with the given activity type
    pub fn handle_for_type(&self, activity_type: &str) -> Option<HostHandle> {
        self.surfaces
            .lock()
            .unwrap()
            .iter()
            .find(|(_, s)| s.activity_type == activity_type)
            .map(|(handle, _)| handle.clone())
    }

    /// Content currently displayed for a surface
    pub fn content_state_of(&self, handle: &HostHandle) -> Option<serde_json::Value> {
        self.surfaces
            .lock()
            .unwrap()
            .get(handle)
            .map(|s| s.content_state.clone())
    }

    fn check_enabled(&self) -> Result<(), HostError> {
        if self.availability.lock().unwrap().is_enabled() {
            Ok(())
        } else {
            Err(HostError::Unsupported)
        }
    }
}

#[async_trait]
impl LiveActivityHost for InMemoryHost {
    fn availability(&self) -> Availability {
        *self.availability.lock().unwrap()
    }

    async fn materialize(
        &self,
        activity_type: &str,
        _attributes: &serde_json::Value,
        content_state: &serde_json::Value,
    ) -> Result<HostHandle, HostError> {
        self.check_enabled()?;

        if std::mem::take(&mut *self.fail_next_materialize.lock().unwrap()) {
            return Err(HostError::Rejected("materialize failure injected".to_string()));
        }

        let handle = HostHandle::new(Uuid::new_v4().to_string());
        self.surfaces.lock().unwrap().insert(
            handle.clone(),
            Surface {
                activity_type: activity_type.to_string(),
                content_state: content_state.clone(),
                pending_dismissal: None,
            },
        );

        tracing::debug!("Materialized '{}' surface {}", activity_type, handle);
        Ok(handle)
    }

    async fn apply_update(
        &self,
        handle: &HostHandle,
        content_state: &serde_json::Value,
        alert: Option<&AlertConfig>,
        _stale_date: Option<DateTime<Utc>>,
    ) -> Result<(), HostError> {
        self.check_enabled()?;

        let mut surfaces = self.surfaces.lock().unwrap();
        let surface = surfaces
            .get_mut(handle)
            .ok_or_else(|| HostError::Rejected(format!("unknown surface {}", handle)))?;

        surface.content_state = content_state.clone();

        if let Some(alert) = alert {
            tracing::debug!(
                "Alert on {}: {:?} / {:?}",
                handle,
                alert.title,
                alert.body
            );
        }

        Ok(())
    }

    async fn teardown(
        &self,
        handle: &HostHandle,
        policy: &DismissalPolicy,
    ) -> Result<(), HostError> {
        self.check_enabled()?;

        if self.fail_teardown_for.lock().unwrap().remove(handle) {
            return Err(HostError::Rejected("teardown failure injected".to_string()));
        }

        let mut surfaces = self.surfaces.lock().unwrap();
        if !surfaces.contains_key(handle) {
            return Err(HostError::Rejected(format!("unknown surface {}", handle)));
        }

        match policy {
            DismissalPolicy::Immediate => {
                surfaces.remove(handle);
                tracing::debug!("Tore down surface {} immediately", handle);
            }
            policy => {
                // Retention window is host-owned; the surface lingers until
                // confirm_teardown fires the TeardownConfirmed event
                if let Some(surface) = surfaces.get_mut(handle) {
                    surface.pending_dismissal = Some(policy.clone());
                }
                tracing::debug!("Deferred teardown of surface {} ({})", handle, policy);
            }
        }

        Ok(())
    }
}
