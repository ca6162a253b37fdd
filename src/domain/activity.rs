use chrono::{DateTime, Utc};
use instant::Instant;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Activity ID (unique within the registry, never reused)
pub type ActivityId = Uuid;

/// Activity lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ActivityStatus {
    /// Requested, host has not materialized the surface yet
    Pending,
    /// Surface is live and updatable
    Active,
    /// Ended by the app, surface retained until the host confirms teardown
    Ending,
    /// Torn down (terminal)
    Ended,
    /// Host refused to materialize the surface (terminal, never registered)
    Failed,
}

impl ActivityStatus {
    /// Activity is visible to enumeration (Active or Ending)
    pub fn is_live(&self) -> bool {
        matches!(self, ActivityStatus::Active | ActivityStatus::Ending)
    }

    /// No further transitions possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActivityStatus::Ended | ActivityStatus::Failed)
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityStatus::Pending => write!(f, "Pending"),
            ActivityStatus::Active => write!(f, "Active"),
            ActivityStatus::Ending => write!(f, "Ending"),
            ActivityStatus::Ended => write!(f, "Ended"),
            ActivityStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// When the external surface is actually removed after `end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum DismissalPolicy {
    /// Tear the surface down synchronously
    Immediate,
    /// Defer to the host's built-in retention window
    Default,
    /// Keep the surface visible until the given time
    After(DateTime<Utc>),
}

/// Error for unrecognized dismissal policy strings
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("unknown dismissal policy: {0}")]
pub struct UnknownPolicy(pub String);

impl FromStr for DismissalPolicy {
    type Err = UnknownPolicy;

    /// Parse the wire strings used by bridge layers ("immediate", "default").
    /// `After` carries a timestamp and has no bare string form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" => Ok(DismissalPolicy::Immediate),
            "default" => Ok(DismissalPolicy::Default),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for DismissalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DismissalPolicy::Immediate => write!(f, "immediate"),
            DismissalPolicy::Default => write!(f, "default"),
            DismissalPolicy::After(date) => write!(f, "after {}", date.to_rfc3339()),
        }
    }
}

/// One-shot alert attached to a single update (not persisted into state)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AlertConfig {
    pub title: Option<String>,
    pub body: Option<String>,
    pub sound: Option<String>,
}

impl AlertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }
}

/// Timestamp in milliseconds since application start (monotonic)
///
/// Serializable and comparable, suitable for deterministic creation
/// ordering and display tie-breaks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp representing the current moment
    pub fn now() -> Self {
        // Use a static anchor point for all timestamps in the process
        static ANCHOR: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
        let anchor = ANCHOR.get_or_init(Instant::now);

        let elapsed = Instant::now().duration_since(*anchor);
        Timestamp(elapsed.as_millis() as u64)
    }

    /// Get the raw milliseconds value
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Create a timestamp from a raw milliseconds value (for testing)
    #[cfg(test)]
    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Domain entity representing one live activity
///
/// `activity_type`, `attributes` and `created_at` are fixed at creation;
/// everything else mutates through the lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Activity {
    /// Unique identifier, assigned at creation
    id: ActivityId,
    /// Template tag classifying the activity (immutable)
    activity_type: String,
    /// Immutable key-value document fixed at creation
    attributes: serde_json::Value,
    /// Mutable key-value document, replaced wholesale on update
    content_state: serde_json::Value,
    /// Content is considered stale past this instant (read lazily)
    stale_date: Option<DateTime<Utc>>,
    /// Display ranking hint (0-100, higher = more prominent)
    relevance_score: Option<f64>,
    /// Opaque push credential, arrives asynchronously from the host
    push_token: Option<String>,
    /// Recorded once `end` is accepted
    dismissal_policy: Option<DismissalPolicy>,
    /// Current lifecycle state
    status: ActivityStatus,
    /// Creation instant (for insertion ordering and tie-breaks)
    created_at: Timestamp,
}

impl Activity {
    /// Create a new activity in `Pending` state
    pub fn new(
        activity_type: String,
        attributes: serde_json::Value,
        content_state: serde_json::Value,
        stale_date: Option<DateTime<Utc>>,
        relevance_score: Option<f64>,
    ) -> Self {
        Activity {
            id: Uuid::new_v4(),
            activity_type,
            attributes,
            content_state,
            stale_date,
            relevance_score,
            push_token: None,
            dismissal_policy: None,
            status: ActivityStatus::Pending,
            created_at: Timestamp::now(),
        }
    }

    /// Create with an explicit creation timestamp (for testing)
    #[cfg(test)]
    pub fn with_created_at(
        activity_type: String,
        content_state: serde_json::Value,
        relevance_score: Option<f64>,
        created_at: Timestamp,
    ) -> Self {
        Activity {
            id: Uuid::new_v4(),
            activity_type,
            attributes: serde_json::Value::Null,
            content_state,
            stale_date: None,
            relevance_score,
            push_token: None,
            dismissal_policy: None,
            status: ActivityStatus::Active,
            created_at,
        }
    }

    // ===== Getters =====

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn activity_type(&self) -> &str {
        &self.activity_type
    }

    pub fn attributes(&self) -> &serde_json::Value {
        &self.attributes
    }

    pub fn content_state(&self) -> &serde_json::Value {
        &self.content_state
    }

    pub fn stale_date(&self) -> Option<DateTime<Utc>> {
        self.stale_date
    }

    pub fn relevance_score(&self) -> Option<f64> {
        self.relevance_score
    }

    pub fn push_token(&self) -> Option<&str> {
        self.push_token.as_deref()
    }

    pub fn dismissal_policy(&self) -> Option<&DismissalPolicy> {
        self.dismissal_policy.as_ref()
    }

    pub fn status(&self) -> ActivityStatus {
        self.status
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    // ===== Queries =====

    /// Whether the content is past its declared freshness window at `now`.
    /// A stale activity stays updatable; staleness only affects rendering.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        match self.stale_date {
            Some(date) => now >= date,
            None => false,
        }
    }

    // ===== State mutations =====
    //
    // Transition legality is checked by the engine before calling these;
    // the entity only records the outcome.

    /// Pending -> Active (host materialized the surface)
    pub fn activate(&mut self) {
        self.status = ActivityStatus::Active;
    }

    /// Active -> Ending, recording the dismissal policy
    pub fn begin_ending(&mut self, policy: DismissalPolicy) {
        self.dismissal_policy = Some(policy);
        self.status = ActivityStatus::Ending;
    }

    /// Ending -> Ended (host confirmed teardown)
    pub fn mark_ended(&mut self) {
        self.status = ActivityStatus::Ended;
    }

    /// Pending -> Failed (host refused to materialize)
    pub fn fail(&mut self) {
        self.status = ActivityStatus::Failed;
    }

    /// Replace the content state wholesale (never merged)
    pub fn set_content_state(&mut self, content_state: serde_json::Value) {
        self.content_state = content_state;
    }

    pub fn set_stale_date(&mut self, stale_date: Option<DateTime<Utc>>) {
        self.stale_date = stale_date;
    }

    pub fn set_relevance_score(&mut self, relevance_score: Option<f64>) {
        self.relevance_score = relevance_score;
    }

    pub fn set_push_token(&mut self, push_token: Option<String>) {
        self.push_token = push_token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_activity() -> Activity {
        Activity::new(
            "delivery-tracking-v1".to_string(),
            serde_json::json!({"orderId": "42"}),
            serde_json::json!({"eta": "10:00"}),
            None,
            Some(1.0),
        )
    }

    #[test]
    fn test_new_activity_is_pending() {
        let activity = sample_activity();

        assert_eq!(activity.status(), ActivityStatus::Pending);
        assert_eq!(activity.activity_type(), "delivery-tracking-v1");
        assert!(activity.push_token().is_none());
        assert!(activity.dismissal_policy().is_none());
    }

    #[test]
    fn test_unique_ids() {
        let a = sample_activity();
        let b = sample_activity();

        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut activity = sample_activity();

        activity.activate();
        assert_eq!(activity.status(), ActivityStatus::Active);
        assert!(activity.status().is_live());

        activity.begin_ending(DismissalPolicy::Default);
        assert_eq!(activity.status(), ActivityStatus::Ending);
        assert!(activity.status().is_live());
        assert_eq!(
            activity.dismissal_policy(),
            Some(&DismissalPolicy::Default)
        );

        activity.mark_ended();
        assert_eq!(activity.status(), ActivityStatus::Ended);
        assert!(activity.status().is_terminal());
        assert!(!activity.status().is_live());
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut activity = sample_activity();
        activity.fail();

        assert_eq!(activity.status(), ActivityStatus::Failed);
        assert!(activity.status().is_terminal());
    }

    #[test]
    fn test_content_state_replaced_wholesale() {
        let mut activity = sample_activity();

        activity.set_content_state(serde_json::json!({"status": "nearby"}));

        // The old "eta" key is gone, not merged
        assert_eq!(
            activity.content_state(),
            &serde_json::json!({"status": "nearby"})
        );
    }

    #[test]
    fn test_staleness_is_lazy() {
        let mut activity = sample_activity();
        let now = Utc::now();

        assert!(!activity.is_stale_at(now));

        activity.set_stale_date(Some(now - Duration::seconds(10)));
        assert!(activity.is_stale_at(now));

        activity.set_stale_date(Some(now + Duration::seconds(10)));
        assert!(!activity.is_stale_at(now));
    }

    #[test]
    fn test_dismissal_policy_parsing() {
        assert_eq!(
            "immediate".parse::<DismissalPolicy>(),
            Ok(DismissalPolicy::Immediate)
        );
        assert_eq!(
            "default".parse::<DismissalPolicy>(),
            Ok(DismissalPolicy::Default)
        );
        assert_eq!(
            "after-date".parse::<DismissalPolicy>(),
            Err(UnknownPolicy("after-date".to_string()))
        );
    }

    #[test]
    fn test_alert_config_builder() {
        let alert = AlertConfig::new()
            .with_title("Order update")
            .with_body("Your courier is nearby")
            .with_sound("default");

        assert_eq!(alert.title.as_deref(), Some("Order update"));
        assert_eq!(alert.body.as_deref(), Some("Your courier is nearby"));
        assert_eq!(alert.sound.as_deref(), Some("default"));
    }

    #[test]
    fn test_timestamp_ordering() {
        let t1 = Timestamp::from_millis(100);
        let t2 = Timestamp::from_millis(200);

        assert!(t1 < t2);
        assert_eq!(t2, Timestamp::from_millis(200));
    }

    #[test]
    fn test_activity_serialization() {
        let activity = sample_activity();

        let json = serde_json::to_string(&activity).unwrap();
        let deserialized: Activity = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.id(), activity.id());
        assert_eq!(deserialized.activity_type(), activity.activity_type());
        assert_eq!(deserialized.content_state(), activity.content_state());
        assert_eq!(deserialized.status(), activity.status());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ActivityStatus::Active.to_string(), "Active");
        assert_eq!(ActivityStatus::Ending.to_string(), "Ending");
    }
}
