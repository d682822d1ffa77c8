//! Create an indexing job and provision its upstream subscription
//!
//! The job row is inserted in `pending` first so the subscription can point
//! at its id. Provisioning failures leave the row in `error` with a message
//! rather than deleting it, so the failure stays visible on the job.

use blockdex_common::JobType;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::features::shared::validation::{validate_name, NameValidationError, MAX_NAME_LENGTH};
use crate::models::{IndexingJob, JobConfig, INDEXING_JOB_COLUMNS};
use crate::provider::WebhookProvider;
use crate::queue::{IndexingTask, TaskQueue};
use crate::sink::{TableName, TableNameError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobCommand {
    pub name: String,
    #[serde(alias = "databaseConfigId")]
    pub database_config_id: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub config: JobConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateJobError {
    #[error("{0}")]
    InvalidName(#[from] NameValidationError),
    #[error("Unsupported indexing type: {0}")]
    InvalidType(String),
    #[error("Invalid table name: {0}")]
    InvalidTableName(#[from] TableNameError),
    #[error("Database config {0} not found")]
    DatabaseConfigNotFound(Uuid),
    #[error("Failed to create webhook: {0}")]
    Webhook(String),
    #[error("Failed to schedule initial data fetch: {0}")]
    Queue(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateJobCommand {
    pub fn validate(&self) -> Result<JobType, CreateJobError> {
        validate_name(&self.name, MAX_NAME_LENGTH)?;
        TableName::parse(&self.config.table_name)?;
        self.job_type
            .parse::<JobType>()
            .map_err(|_| CreateJobError::InvalidType(self.job_type.clone()))
    }
}

#[tracing::instrument(
    skip(pool, provider, queue, command),
    fields(name = %command.name, job_type = %command.job_type)
)]
pub async fn handle(
    pool: PgPool,
    provider: &dyn WebhookProvider,
    queue: &dyn TaskQueue,
    command: CreateJobCommand,
) -> Result<IndexingJob, CreateJobError> {
    let job_type = command.validate()?;

    let config_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM database_configs WHERE id = $1)")
            .bind(command.database_config_id)
            .fetch_one(&pool)
            .await?;
    if !config_exists {
        return Err(CreateJobError::DatabaseConfigNotFound(command.database_config_id));
    }

    let mut job = sqlx::query_as::<_, IndexingJob>(&format!(
        "INSERT INTO indexing_jobs (id, name, job_type, config, status, database_config_id)
         VALUES ($1, $2, $3, $4, 'pending', $5)
         RETURNING {INDEXING_JOB_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(command.name.trim())
    .bind(job_type.as_str())
    .bind(Json(&command.config))
    .bind(command.database_config_id)
    .fetch_one(&pool)
    .await?;

    match provider.create_subscription(&job).await {
        Ok(Some(webhook_id)) => {
            job = store_webhook_id(&pool, job.id, &webhook_id).await?;
            if let Err(e) = provider.update_subscription_target(&webhook_id, job.id).await {
                return Err(fail(&pool, job.id, CreateJobError::Webhook(e.to_string())).await);
            }
        },
        Ok(None) => {
            tracing::debug!(provider = provider.name(), "Provider keeps no subscription");
        },
        Err(e) => return Err(fail(&pool, job.id, CreateJobError::Webhook(e.to_string())).await),
    }

    if let Err(e) = queue.enqueue(IndexingTask::initial_data_fetch(job.id)).await {
        return Err(fail(&pool, job.id, CreateJobError::Queue(e.to_string())).await);
    }

    tracing::info!(job_id = %job.id, webhook_id = ?job.webhook_id, "Indexing job created");
    Ok(job)
}

async fn store_webhook_id(pool: &PgPool, id: Uuid, webhook_id: &str) -> Result<IndexingJob, sqlx::Error> {
    sqlx::query_as::<_, IndexingJob>(&format!(
        "UPDATE indexing_jobs SET webhook_id = $2, updated_at = NOW()
         WHERE id = $1
         RETURNING {INDEXING_JOB_COLUMNS}"
    ))
    .bind(id)
    .bind(webhook_id)
    .fetch_one(pool)
    .await
}

/// Move the job to `error` with the failure message and hand the failure back
async fn fail(pool: &PgPool, id: Uuid, error: CreateJobError) -> CreateJobError {
    let message = error.to_string();
    tracing::error!(job_id = %id, error = %message, "Indexing job provisioning failed");

    let result = sqlx::query(
        "UPDATE indexing_jobs SET status = 'error', error = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(&message)
    .execute(pool)
    .await;

    match result {
        Ok(_) => error,
        Err(e) => CreateJobError::Database(e),
    }
}
