use crate::traits::ActivityTemplate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery Tracking - order-on-its-way surface
///
/// Attributes carry the facts fixed when the order ships; the content
/// state follows the courier until the final delivered/failed write.
pub struct DeliveryTracking;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAttributes {
    pub courier_name: String,
    pub order_number: String,
    pub order_items: Option<String>,
    pub delivery_address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    Preparing,
    OutForDelivery,
    Nearby,
    Delivered,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryState {
    pub status: DeliveryStatus,
    pub current_location: Option<String>,
    pub estimated_arrival: DateTime<Utc>,
    pub stops_remaining: Option<u32>,
}

impl DeliveryState {
    pub fn new(status: DeliveryStatus, estimated_arrival: DateTime<Utc>) -> Self {
        Self {
            status,
            current_location: None,
            estimated_arrival,
            stops_remaining: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.current_location = Some(location.into());
        self
    }

    pub fn with_stops_remaining(mut self, stops: u32) -> Self {
        self.stops_remaining = Some(stops);
        self
    }
}

impl ActivityTemplate for DeliveryTracking {
    type Attributes = DeliveryAttributes;
    type ContentState = DeliveryState;

    fn activity_type() -> &'static str {
        "delivery-tracking-v1"
    }
}

impl DeliveryTracking {
    /// Final content for `end`: the terminal delivered/failed status
    pub fn final_content(delivered: bool) -> serde_json::Value {
        let status = if delivered { "delivered" } else { "failed" };
        serde_json::json!({ "status": status })
    }
}
