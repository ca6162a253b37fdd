use crate::traits::ActivityTemplate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Countdown Timer - running/paused timer surface
pub struct CountdownTimer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerAttributes {
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl TimerAttributes {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            icon: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub end_time: DateTime<Utc>,
    pub is_paused: bool,
    pub remaining_seconds: Option<f64>,
}

impl TimerState {
    /// Running timer counting down to `end_time`
    pub fn running(end_time: DateTime<Utc>) -> Self {
        Self {
            end_time,
            is_paused: false,
            remaining_seconds: None,
        }
    }

    /// Paused timer frozen at `remaining_seconds`
    pub fn paused(end_time: DateTime<Utc>, remaining_seconds: f64) -> Self {
        Self {
            end_time,
            is_paused: true,
            remaining_seconds: Some(remaining_seconds),
        }
    }
}

impl ActivityTemplate for CountdownTimer {
    type Attributes = TimerAttributes;
    type ContentState = TimerState;

    fn activity_type() -> &'static str {
        "countdown-timer-v1"
    }
}
