//! In-process queue that decouples the engine from billing and tracking workers.
//!
//! `JobQueue` implements both fire-and-forget ports by sending onto an unbounded
//! channel. `run_job_dispatch_loop` drains that channel into a `JobSink`, retrying
//! each push a few times before giving up on the job.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    application::ports::{
        billing_trigger::BillingTrigger,
        event_notifier::{EventNotifier, TrackingEvent},
    },
    infra::error::InfraError,
};

const MAX_PUSH_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF_MS: u64 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum Job {
    BillSubscription {
        subscription_id: Uuid,
        timestamp: i64,
    },
    SegmentTrack(TrackingEvent),
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Job::BillSubscription { .. } => "bill_subscription",
            Job::SegmentTrack(_) => "segment_track",
        }
    }
}

/// Destination that background workers consume jobs from.
#[async_trait]
pub trait JobSink: Send + Sync {
    async fn push(&self, job: &Job) -> Result<(), InfraError>;
}

#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl JobQueue {
    /// The dispatch loop stops once every clone of the returned queue is dropped.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Job>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn enqueue(&self, job: Job) {
        let kind = job.kind();
        if self.sender.send(job).is_err() {
            warn!(kind, "Job queue closed, dropping job");
        }
    }
}

impl BillingTrigger for JobQueue {
    fn schedule(&self, subscription_id: Uuid, at_unix_timestamp: i64) {
        self.enqueue(Job::BillSubscription {
            subscription_id,
            timestamp: at_unix_timestamp,
        });
    }
}

impl EventNotifier for JobQueue {
    fn emit(&self, event: TrackingEvent) {
        self.enqueue(Job::SegmentTrack(event));
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_PUSH_ATTEMPTS,
            backoff: Duration::from_millis(RETRY_BACKOFF_MS),
        }
    }
}

pub async fn run_job_dispatch_loop(
    mut receiver: mpsc::UnboundedReceiver<Job>,
    sink: Arc<dyn JobSink>,
    policy: RetryPolicy,
) {
    info!(
        max_attempts = policy.max_attempts,
        "Job dispatch worker started"
    );

    let mut delivered = 0usize;
    let mut dropped = 0usize;

    while let Some(job) = receiver.recv().await {
        if dispatch_one(sink.as_ref(), &job, policy).await {
            delivered += 1;
        } else {
            dropped += 1;
        }
    }

    info!(delivered, dropped, "Job dispatch worker stopped");
}

async fn dispatch_one(sink: &dyn JobSink, job: &Job, policy: RetryPolicy) -> bool {
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        match sink.push(job).await {
            Ok(()) => {
                debug!(kind = job.kind(), attempt, "Job dispatched");
                return true;
            }
            Err(e) if attempt < attempts => {
                warn!(kind = job.kind(), attempt, error = %e, "Job push failed, retrying");
                tokio::time::sleep(policy.backoff * attempt).await;
            }
            Err(e) => {
                error!(kind = job.kind(), attempts, error = %e, "Job push failed, dropping job");
            }
        }
    }

    false
}
