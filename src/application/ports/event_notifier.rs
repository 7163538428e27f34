use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SUBSCRIPTION_CREATED_EVENT: &str = "subscription_created";

/// Analytics event forwarded to the tracking pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Who performed the action, when known.
    pub membership_id: Option<Uuid>,
    pub event: String,
    pub properties: serde_json::Value,
}

/// Fire-and-forget sink for tracking events. No delivery guarantee.
pub trait EventNotifier: Send + Sync {
    fn emit(&self, event: TrackingEvent);
}
