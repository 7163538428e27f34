//! Recording implementations of the fire-and-forget ports and of `JobSink`.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

use crate::{
    application::ports::{
        billing_trigger::BillingTrigger,
        event_notifier::{EventNotifier, TrackingEvent},
    },
    infra::{
        error::InfraError,
        job_queue::{Job, JobSink},
    },
};

// ============================================================================
// Ports
// ============================================================================

#[derive(Default)]
pub struct RecordingBillingTrigger {
    pub scheduled: Mutex<Vec<(Uuid, i64)>>,
}

impl RecordingBillingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> Vec<(Uuid, i64)> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn scheduled_ids(&self) -> Vec<Uuid> {
        self.scheduled().into_iter().map(|(id, _)| id).collect()
    }
}

impl BillingTrigger for RecordingBillingTrigger {
    fn schedule(&self, subscription_id: Uuid, at_unix_timestamp: i64) {
        self.scheduled
            .lock()
            .unwrap()
            .push((subscription_id, at_unix_timestamp));
    }
}

#[derive(Default)]
pub struct RecordingEventNotifier {
    pub events: Mutex<Vec<TrackingEvent>>,
}

impl RecordingEventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TrackingEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventNotifier for RecordingEventNotifier {
    fn emit(&self, event: TrackingEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ============================================================================
// Job sinks
// ============================================================================

/// Accepts every job after failing the first `failures` pushes.
#[derive(Default)]
pub struct RecordingJobSink {
    pub pushed: Mutex<Vec<Job>>,
    failures_left: AtomicU32,
    pub attempts: AtomicU32,
}

impl RecordingJobSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failures: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            ..Self::default()
        }
    }

    pub fn pushed(&self) -> Vec<Job> {
        self.pushed.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobSink for RecordingJobSink {
    async fn push(&self, job: &Job) -> Result<(), InfraError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(InfraError::JobSink(format!(
                "simulated failure for {}",
                job.kind()
            )));
        }

        self.pushed.lock().unwrap().push(job.clone());
        Ok(())
    }
}
