//! Upstream webhook provider boundary
//!
//! The registry provisions and controls upstream subscriptions through
//! [`WebhookProvider`]; the pipeline asks it for a job's initial dataset.
//! [`HeliusProvider`] talks to the Helius REST API, [`DirectDeliveryProvider`]
//! is used when no provider is configured and events are pushed straight to
//! the ingestion endpoint.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::IndexingJob;
use crate::sink::SinkRecord;

pub mod direct;
pub mod helius;

pub use direct::DirectDeliveryProvider;
pub use helius::HeliusProvider;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),

    #[error("Unsupported job for provider: {0}")]
    UnsupportedJob(String),
}

#[async_trait]
pub trait WebhookProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Register a subscription for the job. `None` means the provider does
    /// not manage subscriptions and the job keeps no webhook id.
    async fn create_subscription(&self, job: &IndexingJob) -> Result<Option<String>, ProviderError>;

    /// Point an existing subscription at the job's ingestion URL
    async fn update_subscription_target(
        &self,
        subscription_id: &str,
        job_id: Uuid,
    ) -> Result<(), ProviderError>;

    async fn pause_subscription(&self, subscription_id: &str) -> Result<(), ProviderError>;

    async fn resume_subscription(&self, subscription_id: &str) -> Result<(), ProviderError>;

    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), ProviderError>;

    /// Materialized backfill rows for a freshly created job
    async fn fetch_initial_dataset(&self, job: &IndexingJob) -> Result<Vec<SinkRecord>, ProviderError>;
}

#[cfg(test)]
pub mod testing;
