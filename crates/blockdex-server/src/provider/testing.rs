//! Recording provider for command and pipeline tests

use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

use super::{ProviderError, WebhookProvider};
use crate::models::IndexingJob;
use crate::sink::SinkRecord;

/// Records every call as `"<op>:<args>"`. Optionally hands out a
/// subscription id, fails every call, or serves a fixed backfill.
#[derive(Default)]
pub struct RecordingProvider {
    subscription_id: Option<String>,
    fail: bool,
    backfill: Vec<SinkRecord>,
    calls: Mutex<Vec<String>>,
}

impl RecordingProvider {
    pub fn with_subscription(id: &str) -> Self {
        Self {
            subscription_id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_backfill(records: Vec<SinkRecord>) -> Self {
        Self {
            backfill: records,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) -> Result<(), ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.fail {
            return Err(ProviderError::Status {
                status: 503,
                message: "provider unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WebhookProvider for RecordingProvider {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn create_subscription(&self, job: &IndexingJob) -> Result<Option<String>, ProviderError> {
        self.record(format!("create:{}", job.id))?;
        Ok(self.subscription_id.clone())
    }

    async fn update_subscription_target(
        &self,
        subscription_id: &str,
        job_id: Uuid,
    ) -> Result<(), ProviderError> {
        self.record(format!("target:{subscription_id}:{job_id}"))
    }

    async fn pause_subscription(&self, subscription_id: &str) -> Result<(), ProviderError> {
        self.record(format!("pause:{subscription_id}"))
    }

    async fn resume_subscription(&self, subscription_id: &str) -> Result<(), ProviderError> {
        self.record(format!("resume:{subscription_id}"))
    }

    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), ProviderError> {
        self.record(format!("delete:{subscription_id}"))
    }

    async fn fetch_initial_dataset(&self, job: &IndexingJob) -> Result<Vec<SinkRecord>, ProviderError> {
        self.record(format!("backfill:{}", job.id))?;
        Ok(self.backfill.clone())
    }
}
