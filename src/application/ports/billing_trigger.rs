use uuid::Uuid;

/// Requests an invoice run for a subscription as of a point in time.
///
/// Implementations enqueue and return immediately. Delivery is at-least-once and
/// failures stay inside the implementation; the caller never observes them.
pub trait BillingTrigger: Send + Sync {
    fn schedule(&self, subscription_id: Uuid, at_unix_timestamp: i64);
}
