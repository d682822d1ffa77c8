//! Registry seam used by the indexing pipeline
//!
//! The pipeline only needs to read a job with its tenant store and to report
//! outcomes. [`PgJobRegistry`] routes those calls through the same command
//! and query handlers the HTTP API uses.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::commands::{
    activate::{self, ActivateJobCommand, ActivateJobError},
    record_statistics::{self, RecordStatisticsCommand, RecordStatisticsError},
};
use super::queries::get::{self, GetJobError, GetJobQuery};
use crate::models::{DatabaseConfig, IndexingJob, DATABASE_CONFIG_COLUMNS};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Indexing job {0} not found")]
    JobNotFound(Uuid),

    #[error("Database config {0} not found")]
    DatabaseConfigNotFound(Uuid),

    #[error("{0}")]
    Conflict(String),

    #[error("Registry storage error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait JobRegistry: Send + Sync {
    async fn job(&self, id: Uuid) -> Result<IndexingJob, RegistryError>;

    async fn database_config(&self, id: Uuid) -> Result<DatabaseConfig, RegistryError>;

    /// `pending → active`; a conflict for any other state
    async fn activate(&self, id: Uuid) -> Result<(), RegistryError>;

    async fn record_statistics(
        &self,
        id: Uuid,
        records_added: u64,
        processing_time_ms: u64,
        error: Option<String>,
    ) -> Result<(), RegistryError>;
}

#[derive(Clone)]
pub struct PgJobRegistry {
    pool: PgPool,
}

impl PgJobRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRegistry for PgJobRegistry {
    async fn job(&self, id: Uuid) -> Result<IndexingJob, RegistryError> {
        get::handle(self.pool.clone(), GetJobQuery { id })
            .await
            .map_err(|e| match e {
                GetJobError::NotFound(id) => RegistryError::JobNotFound(id),
                GetJobError::Database(e) => RegistryError::Database(e),
            })
    }

    async fn database_config(&self, id: Uuid) -> Result<DatabaseConfig, RegistryError> {
        sqlx::query_as::<_, DatabaseConfig>(&format!(
            "SELECT {DATABASE_CONFIG_COLUMNS} FROM database_configs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RegistryError::DatabaseConfigNotFound(id))
    }

    async fn activate(&self, id: Uuid) -> Result<(), RegistryError> {
        activate::handle(self.pool.clone(), ActivateJobCommand { id })
            .await
            .map(|_| ())
            .map_err(|e| match e {
                ActivateJobError::NotFound(id) => RegistryError::JobNotFound(id),
                ActivateJobError::Conflict { .. } => RegistryError::Conflict(e.to_string()),
                ActivateJobError::Database(e) => RegistryError::Database(e),
            })
    }

    async fn record_statistics(
        &self,
        id: Uuid,
        records_added: u64,
        processing_time_ms: u64,
        error: Option<String>,
    ) -> Result<(), RegistryError> {
        let command = RecordStatisticsCommand {
            id,
            records_added: i64::try_from(records_added).unwrap_or(i64::MAX),
            processing_time_ms: i64::try_from(processing_time_ms).unwrap_or(i64::MAX),
            error,
        };

        record_statistics::handle(self.pool.clone(), command)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                RecordStatisticsError::NotFound(id) => RegistryError::JobNotFound(id),
                RecordStatisticsError::NegativeRecords(_) => RegistryError::Conflict(e.to_string()),
                RecordStatisticsError::Database(e) => RegistryError::Database(e),
            })
    }
}
