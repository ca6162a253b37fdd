use crate::application::{ActivityError, ActivityEvent, CapabilityProbe, Result};
use crate::domain::{
    Activity, ActivityId, ActivityRegistry, ActivityStatus, AlertConfig, DismissalPolicy,
};
use crate::infrastructure::{HostEvent, HostHandle, LiveActivityHost};
use crate::traits::ActivityTemplate;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;

/// Start request for a new activity
#[derive(Debug, Clone)]
pub struct StartConfig {
    activity_type: String,
    attributes: serde_json::Value,
    content_state: serde_json::Value,
    stale_date: Option<DateTime<Utc>>,
    relevance_score: Option<f64>,
}

impl StartConfig {
    pub fn new(
        activity_type: impl Into<String>,
        attributes: serde_json::Value,
        content_state: serde_json::Value,
    ) -> Self {
        Self {
            activity_type: activity_type.into(),
            attributes,
            content_state,
            stale_date: None,
            relevance_score: None,
        }
    }

    pub fn with_stale_date(mut self, stale_date: DateTime<Utc>) -> Self {
        self.stale_date = Some(stale_date);
        self
    }

    /// Display ranking hint, 0-100
    pub fn with_relevance_score(mut self, score: f64) -> Self {
        self.relevance_score = Some(score);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.activity_type.is_empty() {
            return Err(ActivityError::InvalidArgument(
                "activity type cannot be empty".to_string(),
            ));
        }

        if let Some(score) = self.relevance_score {
            if !(0.0..=100.0).contains(&score) {
                return Err(ActivityError::InvalidArgument(format!(
                    "relevance score must be within 0-100, got {}",
                    score
                )));
            }
        }

        Ok(())
    }
}

/// Per-id outcomes of `end_all`; partial failures are collected, never
/// short-circuited
#[derive(Debug)]
pub struct EndAllReport {
    pub outcomes: Vec<(ActivityId, Result<()>)>,
}

impl EndAllReport {
    pub fn succeeded(&self) -> Vec<ActivityId> {
        self.outcomes
            .iter()
            .filter(|(_, result)| result.is_ok())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn failed(&self) -> Vec<ActivityId> {
        self.outcomes
            .iter()
            .filter(|(_, result)| result.is_err())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn is_all_ok(&self) -> bool {
        self.outcomes.iter().all(|(_, result)| result.is_ok())
    }
}

/// Bidirectional id <-> host handle index
#[derive(Debug, Default)]
struct HandleTable {
    by_id: HashMap<ActivityId, HostHandle>,
    by_handle: HashMap<HostHandle, ActivityId>,
}

impl HandleTable {
    fn insert(&mut self, id: ActivityId, handle: HostHandle) {
        self.by_handle.insert(handle.clone(), id);
        self.by_id.insert(id, handle);
    }

    fn handle_for(&self, id: ActivityId) -> Option<HostHandle> {
        self.by_id.get(&id).cloned()
    }

    fn id_for(&self, handle: &HostHandle) -> Option<ActivityId> {
        self.by_handle.get(handle).copied()
    }

    fn remove_by_id(&mut self, id: ActivityId) {
        if let Some(handle) = self.by_id.remove(&id) {
            self.by_handle.remove(&handle);
        }
    }

    fn remove_by_handle(&mut self, handle: &HostHandle) -> Option<ActivityId> {
        let id = self.by_handle.remove(handle)?;
        self.by_id.remove(&id);
        Some(id)
    }
}

/// The lifecycle state machine over the registry and the host collaborator.
///
/// All mutating operations are async and resolve once the host confirms.
/// Mutations on the same id are serialized FIFO (last write wins by call
/// order); different ids proceed independently. Reads observe a consistent
/// snapshot at call time. The engine owns no timers: staleness and
/// retention windows live in the stored data and the host.
pub struct LiveActivityEngine {
    host: Arc<dyn LiveActivityHost>,
    probe: CapabilityProbe,
    registry: RwLock<ActivityRegistry>,
    handles: Mutex<HandleTable>,
    mutation_locks: Mutex<HashMap<ActivityId, Arc<AsyncMutex<()>>>>,
    host_events: Mutex<mpsc::UnboundedReceiver<HostEvent>>,
    events: Mutex<Vec<ActivityEvent>>,
}

impl LiveActivityEngine {
    /// Create an engine over a host and its event channel
    pub fn new(
        host: Arc<dyn LiveActivityHost>,
        host_events: mpsc::UnboundedReceiver<HostEvent>,
    ) -> Self {
        let probe = CapabilityProbe::new(host.clone());
        Self {
            host,
            probe,
            registry: RwLock::new(ActivityRegistry::new()),
            handles: Mutex::new(HandleTable::default()),
            mutation_locks: Mutex::new(HashMap::new()),
            host_events: Mutex::new(host_events),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Engine for a host with no live-activity subsystem
    pub fn unsupported() -> Self {
        let (_tx, rx) = mpsc::unbounded_channel();
        Self::new(
            Arc::new(crate::infrastructure::UnsupportedHost::new()),
            rx,
        )
    }

    /// Whether this host can currently display live activities
    pub fn are_activities_enabled(&self) -> bool {
        self.probe.is_supported()
    }

    pub fn probe(&self) -> &CapabilityProbe {
        &self.probe
    }

    /// Start a new activity.
    ///
    /// Registers the entry only after the host materialized the surface; a
    /// host failure leaves no registry trace.
    pub async fn start(&self, config: StartConfig) -> Result<ActivityId> {
        self.pump_host_events();
        config.validate()?;

        let mut activity = Activity::new(
            config.activity_type,
            config.attributes,
            config.content_state,
            config.stale_date,
            config.relevance_score,
        );
        let id = activity.id();

        match self
            .host
            .materialize(
                activity.activity_type(),
                activity.attributes(),
                activity.content_state(),
            )
            .await
        {
            Ok(handle) => {
                activity.activate();
                tracing::info!("Started activity {} ({})", id, activity.activity_type());

                self.registry.write().unwrap().insert(activity)?;
                self.handles.lock().unwrap().insert(id, handle);
                self.push_event(ActivityEvent::Started { id });
                Ok(id)
            }
            Err(err) => {
                activity.fail();
                tracing::warn!(
                    "Host refused to materialize '{}': {}",
                    activity.activity_type(),
                    err
                );
                self.push_event(ActivityEvent::StartFailed {
                    activity_type: activity.activity_type().to_string(),
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Typed start via an [`ActivityTemplate`]
    pub async fn start_template<T: ActivityTemplate>(
        &self,
        attributes: &T::Attributes,
        content_state: &T::ContentState,
    ) -> Result<ActivityId> {
        let attributes = serde_json::to_value(attributes)
            .map_err(|e| ActivityError::InvalidArgument(e.to_string()))?;
        let content_state = serde_json::to_value(content_state)
            .map_err(|e| ActivityError::InvalidArgument(e.to_string()))?;

        self.start(StartConfig::new(T::activity_type(), attributes, content_state))
            .await
    }

    /// Replace an activity's content state, optionally alerting once.
    ///
    /// The alert applies to this transition only and is never persisted.
    /// A stale date already in the past does not block the update.
    pub async fn update(
        &self,
        id: ActivityId,
        content_state: serde_json::Value,
        alert: Option<AlertConfig>,
        stale_date: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.pump_host_events();

        let lock = self.mutation_lock(id);
        let _guard = lock.lock().await;

        let handle = self.checked_active_handle(id)?;

        self.host
            .apply_update(&handle, &content_state, alert.as_ref(), stale_date)
            .await?;

        self.registry.write().unwrap().update(id, |activity| {
            activity.set_content_state(content_state);
            if stale_date.is_some() {
                activity.set_stale_date(stale_date);
            }
        })?;

        tracing::debug!("Updated activity {}", id);
        self.push_event(ActivityEvent::Updated { id });
        Ok(())
    }

    /// Typed update via an [`ActivityTemplate`]
    pub async fn update_template<T: ActivityTemplate>(
        &self,
        id: ActivityId,
        content_state: &T::ContentState,
    ) -> Result<()> {
        let content_state = serde_json::to_value(content_state)
            .map_err(|e| ActivityError::InvalidArgument(e.to_string()))?;

        self.update(id, content_state, None, None).await
    }

    /// End an activity.
    ///
    /// `Immediate` tears the surface down synchronously and removes the
    /// entry. Other policies leave the entry in `Ending` until the host
    /// confirms teardown. Not cancellable once issued to the host.
    pub async fn end(
        &self,
        id: ActivityId,
        final_content: Option<serde_json::Value>,
        policy: DismissalPolicy,
    ) -> Result<()> {
        self.pump_host_events();

        let lock = self.mutation_lock(id);
        let _guard = lock.lock().await;

        let handle = self.checked_active_handle(id)?;

        self.host.teardown(&handle, &policy).await?;

        let immediate = policy == DismissalPolicy::Immediate;
        {
            let mut registry = self.registry.write().unwrap();
            registry.update(id, |activity| {
                if let Some(content) = final_content {
                    activity.set_content_state(content);
                }
                activity.begin_ending(policy);
            })?;

            if immediate {
                let _ = registry.update(id, |activity| activity.mark_ended());
                registry.remove(id);
            }
        }

        if immediate {
            self.handles.lock().unwrap().remove_by_id(id);
            self.mutation_locks.lock().unwrap().remove(&id);
            tracing::info!("Ended activity {} (immediate dismissal)", id);
            self.push_event(ActivityEvent::Ended { id });
        } else {
            tracing::info!("Ending activity {} (deferred dismissal)", id);
            self.push_event(ActivityEvent::Ending { id });
        }

        Ok(())
    }

    /// End every active activity with the default dismissal policy.
    ///
    /// One activity's external failure must not block termination attempts
    /// on the others; the report carries each per-id outcome.
    pub async fn end_all(&self) -> EndAllReport {
        self.pump_host_events();

        let ids: Vec<ActivityId> = {
            let registry = self.registry.read().unwrap();
            registry
                .list()
                .iter()
                .filter(|a| a.status() == ActivityStatus::Active)
                .map(|a| a.id())
                .collect()
        };

        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let result = self.end(id, None, DismissalPolicy::Default).await;
            if let Err(err) = &result {
                tracing::warn!("end_all: activity {} failed: {}", id, err);
            }
            outcomes.push((id, result));
        }

        EndAllReport { outcomes }
    }

    /// Activities with status Active or Ending, in creation order
    pub fn list_active(&self) -> Vec<Activity> {
        self.pump_host_events();

        self.registry
            .read()
            .unwrap()
            .list()
            .iter()
            .filter(|a| a.status().is_live())
            .cloned()
            .collect()
    }

    /// Live activities ranked for a host with `slot_limit` display slots
    pub fn rank_for_display(&self, slot_limit: usize) -> Vec<Activity> {
        self.pump_host_events();

        self.registry
            .read()
            .unwrap()
            .rank_for_display(slot_limit)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Current push token for an activity, if one has been issued.
    /// Never blocks waiting for the host; token arrival is asynchronous.
    pub fn get_push_token(&self, id: ActivityId) -> Option<String> {
        self.pump_host_events();

        self.registry
            .read()
            .unwrap()
            .get(id)
            .ok()
            .and_then(|a| a.push_token().map(str::to_string))
    }

    /// Drain lifecycle notifications accumulated since the last call
    pub fn drain_events(&self) -> Vec<ActivityEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    // ===== Internals =====

    /// FIFO lock serializing mutations per id
    fn mutation_lock(&self, id: ActivityId) -> Arc<AsyncMutex<()>> {
        self.mutation_locks
            .lock()
            .unwrap()
            .entry(id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Resolve the host handle for an id that must be registered and Active
    fn checked_active_handle(&self, id: ActivityId) -> Result<HostHandle> {
        {
            let registry = self.registry.read().unwrap();
            let activity = registry.get(id)?;
            if activity.status() != ActivityStatus::Active {
                return Err(ActivityError::InvalidArgument(format!(
                    "activity {} is not active (status: {})",
                    id,
                    activity.status()
                )));
            }
        }

        self.handles
            .lock()
            .unwrap()
            .handle_for(id)
            .ok_or(ActivityError::NotFound(id))
    }

    /// Route pending host events into the registry. Non-blocking; called
    /// lazily at each operation boundary.
    fn pump_host_events(&self) {
        let pending: Vec<HostEvent> = {
            let mut rx = self.host_events.lock().unwrap();
            let mut pending = Vec::new();
            while let Ok(event) = rx.try_recv() {
                pending.push(event);
            }
            pending
        };

        for event in pending {
            match event {
                HostEvent::PushTokenIssued { handle, token } => {
                    let id = self.handles.lock().unwrap().id_for(&handle);
                    match id {
                        Some(id) => {
                            let updated = self
                                .registry
                                .write()
                                .unwrap()
                                .update(id, |a| a.set_push_token(Some(token)));
                            if updated.is_ok() {
                                tracing::debug!("Push token issued for activity {}", id);
                                self.push_event(ActivityEvent::PushTokenIssued { id });
                            }
                        }
                        None => {
                            tracing::debug!("Push token for unknown surface {}, dropped", handle)
                        }
                    }
                }
                HostEvent::TeardownConfirmed { handle } => {
                    // May race an app-initiated immediate end; registry
                    // removal is idempotent so both orders are fine
                    let id = self.handles.lock().unwrap().remove_by_handle(&handle);
                    if let Some(id) = id {
                        {
                            let mut registry = self.registry.write().unwrap();
                            let _ = registry.update(id, |a| a.mark_ended());
                            registry.remove(id);
                        }
                        self.mutation_locks.lock().unwrap().remove(&id);
                        tracing::info!("Host confirmed teardown of activity {}", id);
                        self.push_event(ActivityEvent::Ended { id });
                    }
                }
            }
        }
    }

    fn push_event(&self, event: ActivityEvent) {
        self.events.lock().unwrap().push(event);
    }
}
