pub mod billing_trigger;
pub mod event_notifier;
