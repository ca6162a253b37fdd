use crate::domain::{Activity, ActivityId};
use std::cmp::Ordering;

/// Errors that can occur in registry operations
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("Activity not found: {0}")]
    NotFound(ActivityId),

    #[error("Activity already exists: {0}")]
    DuplicateId(ActivityId),
}

/// In-process authoritative table of live activities
///
/// Entries are kept in insertion (creation) order; `list` exposes that
/// order directly. Lookups scan by id, which is fine for the handful of
/// surfaces a host ever displays at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityRegistry {
    entries: Vec<Activity>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new activity; fails if the id is already present
    pub fn insert(&mut self, activity: Activity) -> Result<(), RegistryError> {
        if self.entries.iter().any(|a| a.id() == activity.id()) {
            return Err(RegistryError::DuplicateId(activity.id()));
        }

        tracing::debug!("Registered activity {}", activity.id());
        self.entries.push(activity);
        Ok(())
    }

    /// Get an activity by id
    pub fn get(&self, id: ActivityId) -> Result<&Activity, RegistryError> {
        self.entries
            .iter()
            .find(|a| a.id() == id)
            .ok_or(RegistryError::NotFound(id))
    }

    /// Apply a mutator to a single entry; the closure runs within one
    /// mutable borrow, so the fields it touches change atomically
    pub fn update<F>(&mut self, id: ActivityId, mutator: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut Activity),
    {
        let activity = self
            .entries
            .iter_mut()
            .find(|a| a.id() == id)
            .ok_or(RegistryError::NotFound(id))?;

        mutator(activity);
        Ok(())
    }

    /// Remove an activity. Idempotent: removing an absent id is a no-op,
    /// because external teardown confirmation may race an app-initiated end.
    pub fn remove(&mut self, id: ActivityId) -> Option<Activity> {
        let index = self.entries.iter().position(|a| a.id() == id)?;

        tracing::debug!("Removed activity {}", id);
        Some(self.entries.remove(index))
    }

    /// All entries in creation order
    pub fn list(&self) -> &[Activity] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank live entries for a host with a limited number of display slots:
    /// higher relevance score first, unscored entries last, ties broken by
    /// earliest creation time.
    pub fn rank_for_display(&self, slot_limit: usize) -> Vec<&Activity> {
        let mut ranked: Vec<&Activity> = self
            .entries
            .iter()
            .filter(|a| a.status().is_live())
            .collect();

        ranked.sort_by(|a, b| {
            let by_score = match (a.relevance_score(), b.relevance_score()) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            by_score.then_with(|| a.created_at().cmp(&b.created_at()))
        });

        ranked.truncate(slot_limit);
        ranked
    }
}
