use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use crate::infra::{
    error::InfraError,
    job_queue::{Job, JobSink},
};

/// Pushes jobs as JSON onto one Redis list per job kind.
#[derive(Clone)]
pub struct RedisJobSink {
    manager: ConnectionManager,
    billing_key: String,
    tracking_key: String,
}

impl RedisJobSink {
    pub async fn new(
        redis_url: &str,
        billing_key: String,
        tracking_key: String,
    ) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;

        Ok(Self {
            manager,
            billing_key,
            tracking_key,
        })
    }

    fn key_for(&self, job: &Job) -> &str {
        match job {
            Job::BillSubscription { .. } => &self.billing_key,
            Job::SegmentTrack(_) => &self.tracking_key,
        }
    }
}

#[async_trait]
impl JobSink for RedisJobSink {
    async fn push(&self, job: &Job) -> Result<(), InfraError> {
        let payload = serde_json::to_string(job).map_err(InfraError::JobSerialization)?;
        let mut conn = self.manager.clone();

        let _: i64 = conn
            .lpush(self.key_for(job), payload)
            .await
            .map_err(|e| InfraError::JobSink(e.to_string()))?;

        Ok(())
    }
}
