//! Task handlers for initial backfill and webhook events

use blockdex_common::JobStatus;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::{Disposition, PipelineError};
use crate::features::indexing_jobs::JobRegistry;
use crate::models::IndexingJob;
use crate::provider::WebhookProvider;
use crate::queue::IndexingTask;
use crate::sink::{write_records, SinkConnector, SinkRecord, SinkSchema, SinkTarget, TableName};

/// Outcome of a task that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Rows were written (possibly zero after an empty backfill)
    Processed { records: u64 },
    /// Job not in a state that accepts this task
    Skipped,
    /// Nothing survived the transform; no store connection was opened
    NothingToWrite,
}

pub struct IndexingProcessor {
    registry: Arc<dyn JobRegistry>,
    provider: Arc<dyn WebhookProvider>,
    connector: Arc<dyn SinkConnector>,
}

impl IndexingProcessor {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        provider: Arc<dyn WebhookProvider>,
        connector: Arc<dyn SinkConnector>,
    ) -> Self {
        Self {
            registry,
            provider,
            connector,
        }
    }

    /// Run one task to completion. Errors are absorbed here.
    pub async fn handle(&self, task: IndexingTask) {
        let job_id = task.job_id();
        let kind = task.kind();
        let started = Instant::now();

        let result = match task {
            IndexingTask::InitialDataFetch { job_id, .. } => {
                self.initial_data_fetch(job_id, started).await
            },
            IndexingTask::ProcessWebhookEvent {
                job_id, payload, ..
            } => self.process_webhook_event(job_id, &payload, started).await,
        };

        match result {
            Ok(outcome) => debug!(%job_id, kind, ?outcome, "Task finished"),
            Err(err) => self.absorb(job_id, kind, started, err).await,
        }
    }

    /// Load the backfill, write it, and activate the job
    #[tracing::instrument(skip(self, started))]
    pub async fn initial_data_fetch(
        &self,
        job_id: Uuid,
        started: Instant,
    ) -> Result<TaskOutcome, PipelineError> {
        let job = self.registry.job(job_id).await?;
        if job.status != JobStatus::Pending {
            info!(status = %job.status, "Job already provisioned, skipping initial fetch");
            return Ok(TaskOutcome::Skipped);
        }

        let schema = SinkSchema::for_job_type(job.kind()?);
        let records = self.provider.fetch_initial_dataset(&job).await?;

        if records.is_empty() {
            self.registry.activate(job_id).await?;
            info!("No initial data, job activated");
            return Ok(TaskOutcome::Processed { records: 0 });
        }

        let written = self.write(&job, schema, records).await?;
        self.registry
            .record_statistics(job_id, written, elapsed_ms(started), None)
            .await?;
        self.registry.activate(job_id).await?;

        info!(records = written, "Initial data loaded, job activated");
        Ok(TaskOutcome::Processed { records: written })
    }

    /// Transform one delivery and upsert it into the job's table
    #[tracing::instrument(skip(self, payload, started))]
    pub async fn process_webhook_event(
        &self,
        job_id: Uuid,
        payload: &Value,
        started: Instant,
    ) -> Result<TaskOutcome, PipelineError> {
        let job = self.registry.job(job_id).await?;
        // A pause may have landed after the event was queued
        if !job.status.accepts_events() {
            debug!(status = %job.status, "Job not active, dropping event");
            return Ok(TaskOutcome::Skipped);
        }

        let schema = SinkSchema::for_job_type(job.kind()?);
        let records = schema.transform(payload, &job.config);
        if records.is_empty() {
            debug!("No matching records in payload");
            return Ok(TaskOutcome::NothingToWrite);
        }

        let written = self.write(&job, schema, records).await?;
        self.registry
            .record_statistics(job_id, written, elapsed_ms(started), None)
            .await?;

        info!(records = written, job_type = %job.job_type, "Processed webhook event");
        Ok(TaskOutcome::Processed { records: written })
    }

    async fn write(
        &self,
        job: &IndexingJob,
        schema: &'static SinkSchema,
        records: Vec<SinkRecord>,
    ) -> Result<u64, PipelineError> {
        let table = TableName::parse(&job.config.table_name)?;
        let config = self.registry.database_config(job.database_config_id).await?;
        let target = SinkTarget::from_config(&config)?;

        Ok(write_records(self.connector.as_ref(), &target, schema, &table, records).await?)
    }

    async fn absorb(&self, job_id: Uuid, kind: &'static str, started: Instant, err: PipelineError) {
        match err.disposition() {
            Disposition::LogOnly => {
                warn!(%job_id, kind, error = %err, "Task dropped");
            },
            Disposition::RecordOnJob => {
                error!(%job_id, kind, error = %err, "Task failed");
                let recorded = self
                    .registry
                    .record_statistics(job_id, 0, elapsed_ms(started), Some(err.to_string()))
                    .await;
                if let Err(e) = recorded {
                    error!(%job_id, error = %e, "Failed to record task failure on job");
                }
            },
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::features::indexing_jobs::RegistryError;
    use crate::models::{ConnectionStatus, DatabaseConfig, JobConfig};
    use crate::provider::testing::RecordingProvider;
    use crate::sink::records::NftBid;
    use crate::sink::testing::MemoryConnector;
    use async_trait::async_trait;
    use blockdex_common::JobType;
    use chrono::Utc;
    use serde_json::json;
    use sqlx::types::{BigDecimal, Json};
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Mutex;

    /// Mirrors the SQL semantics of activate and record_statistics
    #[derive(Default)]
    struct MemoryRegistry {
        jobs: Mutex<HashMap<Uuid, IndexingJob>>,
    }

    impl MemoryRegistry {
        fn with_job(job: IndexingJob) -> Self {
            let registry = Self::default();
            registry.jobs.lock().unwrap().insert(job.id, job);
            registry
        }

        fn get(&self, id: Uuid) -> IndexingJob {
            self.jobs.lock().unwrap().get(&id).cloned().unwrap()
        }
    }

    #[async_trait]
    impl JobRegistry for MemoryRegistry {
        async fn job(&self, id: Uuid) -> Result<IndexingJob, RegistryError> {
            self.jobs
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or(RegistryError::JobNotFound(id))
        }

        async fn database_config(&self, id: Uuid) -> Result<DatabaseConfig, RegistryError> {
            Ok(DatabaseConfig {
                id,
                name: "warehouse".into(),
                host: "warehouse.internal".into(),
                port: 5432,
                username: "indexer".into(),
                password: "secret".into(),
                database_name: "chain".into(),
                ssl: false,
                status: ConnectionStatus::Connected,
                error: None,
                last_checked_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        }

        async fn activate(&self, id: Uuid) -> Result<(), RegistryError> {
            let mut jobs = self.jobs.lock().unwrap();
            let job = jobs.get_mut(&id).ok_or(RegistryError::JobNotFound(id))?;
            if job.status != JobStatus::Pending {
                return Err(RegistryError::Conflict(format!("status is {}", job.status)));
            }
            job.status = JobStatus::Active;
            job.error = None;
            Ok(())
        }

        async fn record_statistics(
            &self,
            id: Uuid,
            records_added: u64,
            processing_time_ms: u64,
            error: Option<String>,
        ) -> Result<(), RegistryError> {
            let mut jobs = self.jobs.lock().unwrap();
            let job = jobs.get_mut(&id).ok_or(RegistryError::JobNotFound(id))?;
            job.records_indexed += records_added as i64;
            job.last_sync_at = Some(Utc::now());
            job.last_processing_time_ms = Some(processing_time_ms as i64);
            if job.status != JobStatus::Paused {
                match error {
                    Some(message) => {
                        job.status = JobStatus::Error;
                        job.error = Some(message);
                    },
                    None => {
                        if job.status == JobStatus::Error {
                            job.status = JobStatus::Active;
                        }
                        job.error = None;
                    },
                }
            }
            Ok(())
        }
    }

    fn job(job_type: &str, status: JobStatus) -> IndexingJob {
        IndexingJob {
            id: Uuid::new_v4(),
            name: "bids".into(),
            job_type: job_type.into(),
            config: Json(serde_json::from_value::<JobConfig>(json!({ "tableName": "bids" })).unwrap()),
            status,
            database_config_id: Uuid::new_v4(),
            webhook_id: None,
            records_indexed: 0,
            last_sync_at: None,
            last_processing_time_ms: None,
            error: (status == JobStatus::Error).then(|| "earlier failure".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn bid_event(price: &str) -> Value {
        json!([{
            "type": "NFT_BID",
            "source": "TENSOR",
            "events": { "nft": {
                "collection": "degods",
                "mint": "mint-1",
                "amount": price,
                "bidder": "alice"
            }}
        }])
    }

    fn bid(mint: &str, price: &str) -> SinkRecord {
        SinkRecord::NftBid(NftBid {
            collection: "degods".into(),
            mint: mint.into(),
            price: BigDecimal::from_str(price).unwrap(),
            marketplace: "TENSOR".into(),
            bidder: "alice".into(),
            expiry: None,
        })
    }

    fn processor(
        registry: &Arc<MemoryRegistry>,
        provider: RecordingProvider,
        connector: &MemoryConnector,
    ) -> IndexingProcessor {
        IndexingProcessor::new(registry.clone(), Arc::new(provider), Arc::new(connector.clone()))
    }

    #[tokio::test]
    async fn test_empty_backfill_activates_without_connecting() {
        let pending = job("nft_bids", JobStatus::Pending);
        let registry = Arc::new(MemoryRegistry::with_job(pending.clone()));
        let connector = MemoryConnector::default();

        processor(&registry, RecordingProvider::default(), &connector)
            .handle(IndexingTask::initial_data_fetch(pending.id))
            .await;

        let stored = registry.get(pending.id);
        assert_eq!(stored.status, JobStatus::Active);
        assert_eq!(stored.records_indexed, 0);
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_backfill_is_written_then_activated() {
        let pending = job("nft_bids", JobStatus::Pending);
        let registry = Arc::new(MemoryRegistry::with_job(pending.clone()));
        let connector = MemoryConnector::default();
        let provider = RecordingProvider::with_backfill(vec![bid("mint-1", "1"), bid("mint-2", "2")]);

        processor(&registry, provider, &connector)
            .handle(IndexingTask::initial_data_fetch(pending.id))
            .await;

        let stored = registry.get(pending.id);
        assert_eq!(stored.status, JobStatus::Active);
        assert_eq!(stored.records_indexed, 2);
        assert_eq!(connector.tables(), vec!["bids".to_string()]);
        assert_eq!(connector.opened(), connector.closed());
    }

    #[tokio::test]
    async fn test_redelivered_initial_fetch_is_noop() {
        let active = job("nft_bids", JobStatus::Active);
        let registry = Arc::new(MemoryRegistry::with_job(active.clone()));
        let connector = MemoryConnector::default();

        let outcome = processor(&registry, RecordingProvider::default(), &connector)
            .initial_data_fetch(active.id, Instant::now())
            .await
            .unwrap();

        assert_eq!(outcome, TaskOutcome::Skipped);
        assert_eq!(registry.get(active.id).status, JobStatus::Active);
    }

    #[tokio::test]
    async fn test_event_for_paused_job_touches_nothing() {
        let paused = job("nft_bids", JobStatus::Paused);
        let registry = Arc::new(MemoryRegistry::with_job(paused.clone()));
        let connector = MemoryConnector::default();

        processor(&registry, RecordingProvider::default(), &connector)
            .handle(IndexingTask::process_webhook_event(paused.id, bid_event("1")))
            .await;

        let stored = registry.get(paused.id);
        assert_eq!(stored.status, JobStatus::Paused);
        assert!(stored.last_sync_at.is_none());
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_unmatched_payload_opens_no_connection() {
        let active = job("nft_bids", JobStatus::Active);
        let registry = Arc::new(MemoryRegistry::with_job(active.clone()));
        let connector = MemoryConnector::default();

        let outcome = processor(&registry, RecordingProvider::default(), &connector)
            .process_webhook_event(active.id, &json!([{ "type": "SWAP" }]), Instant::now())
            .await
            .unwrap();

        assert_eq!(outcome, TaskOutcome::NothingToWrite);
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_errored_job_drops_later_events() {
        let failed = job("nft_bids", JobStatus::Error);
        let registry = Arc::new(MemoryRegistry::with_job(failed.clone()));
        let connector = MemoryConnector::default();

        let outcome = processor(&registry, RecordingProvider::default(), &connector)
            .process_webhook_event(failed.id, &bid_event("3"), Instant::now())
            .await
            .unwrap();

        assert_eq!(outcome, TaskOutcome::Skipped);
        let stored = registry.get(failed.id);
        assert_eq!(stored.status, JobStatus::Error);
        assert_eq!(stored.error.as_deref(), Some("earlier failure"));
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_recorded_on_job() {
        let active = job("nft_bids", JobStatus::Active);
        let registry = Arc::new(MemoryRegistry::with_job(active.clone()));

        processor(&registry, RecordingProvider::default(), &MemoryConnector::unreachable())
            .handle(IndexingTask::process_webhook_event(active.id, bid_event("1")))
            .await;

        let stored = registry.get(active.id);
        assert_eq!(stored.status, JobStatus::Error);
        assert!(stored.error.unwrap().starts_with("Failed to connect to indexer@warehouse.internal"));
        assert_eq!(stored.records_indexed, 0);
    }

    #[tokio::test]
    async fn test_unsupported_type_is_configuration_error() {
        let pending = job("nft_mints", JobStatus::Pending);
        let registry = Arc::new(MemoryRegistry::with_job(pending.clone()));
        let connector = MemoryConnector::default();

        processor(&registry, RecordingProvider::default(), &connector)
            .handle(IndexingTask::initial_data_fetch(pending.id))
            .await;

        let stored = registry.get(pending.id);
        assert_eq!(stored.status, JobStatus::Error);
        assert_eq!(stored.error.as_deref(), Some("Unsupported indexing type: nft_mints"));
    }

    #[tokio::test]
    async fn test_missing_job_is_dropped() {
        let registry = Arc::new(MemoryRegistry::default());
        let connector = MemoryConnector::default();

        let result = processor(&registry, RecordingProvider::default(), &connector)
            .process_webhook_event(Uuid::new_v4(), &bid_event("1"), Instant::now())
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.disposition(), Disposition::LogOnly);
    }

    #[tokio::test]
    async fn test_overlapping_events_converge_to_last_write() {
        let active = job("nft_bids", JobStatus::Active);
        let registry = Arc::new(MemoryRegistry::with_job(active.clone()));
        let connector = MemoryConnector::default();
        let processor = processor(&registry, RecordingProvider::default(), &connector);

        processor
            .handle(IndexingTask::process_webhook_event(active.id, bid_event("1.5")))
            .await;
        processor
            .handle(IndexingTask::process_webhook_event(active.id, bid_event("2.25")))
            .await;

        match connector.row("bids", ("mint-1", "alice")) {
            Some(SinkRecord::NftBid(stored)) => {
                assert_eq!(stored.price, BigDecimal::from_str("2.25").unwrap())
            },
            other => panic!("unexpected row {:?}", other),
        }
        assert_eq!(connector.row_count(), 1);
        assert_eq!(registry.get(active.id).records_indexed, 2);
    }
}
