//! Provider used when events are pushed directly to the ingestion endpoint

use async_trait::async_trait;
use uuid::Uuid;

use super::{ProviderError, WebhookProvider};
use crate::models::IndexingJob;
use crate::sink::SinkRecord;

/// No upstream subscriptions and no backfill source.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDeliveryProvider;

#[async_trait]
impl WebhookProvider for DirectDeliveryProvider {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn create_subscription(&self, _job: &IndexingJob) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }

    async fn update_subscription_target(
        &self,
        _subscription_id: &str,
        _job_id: Uuid,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn pause_subscription(&self, _subscription_id: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn resume_subscription(&self, _subscription_id: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn delete_subscription(&self, _subscription_id: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn fetch_initial_dataset(&self, _job: &IndexingJob) -> Result<Vec<SinkRecord>, ProviderError> {
        Ok(Vec::new())
    }
}
