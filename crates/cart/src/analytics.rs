//! Analytics events emitted by cart mutations.

use rust_decimal::Decimal;
use serde::Serialize;

/// Tracked cart event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartEvent {
    AddToCart,
    UpdateCartQuantity,
    ClearCart,
}

impl CartEvent {
    /// Wire name of the event.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AddToCart => "add_to_cart",
            Self::UpdateCartQuantity => "update_cart_quantity",
            Self::ClearCart => "clear_cart",
        }
    }
}

/// A structured analytics event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingEvent {
    pub event: CartEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TrackingEvent {
    /// An event with no entity, value or metadata.
    #[must_use]
    pub const fn bare(event: CartEvent) -> Self {
        Self {
            event,
            entity_id: None,
            value: None,
            metadata: None,
        }
    }
}

/// Sink for analytics events.
pub trait Tracker: Send + Sync {
    fn track(&self, event: &TrackingEvent);
}

/// Tracker that writes each event as JSON to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTracker;

impl Tracker for TracingTracker {
    fn track(&self, event: &TrackingEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => tracing::info!(event = event.event.as_str(), %payload, "Tracking event"),
            Err(e) => tracing::warn!(event = event.event.as_str(), "Failed to encode tracking event: {e}"),
        }
    }
}
