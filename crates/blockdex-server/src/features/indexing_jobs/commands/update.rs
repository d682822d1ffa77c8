//! Rename a job or replace its config

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::features::shared::validation::{validate_name, NameValidationError, MAX_NAME_LENGTH};
use crate::models::{IndexingJob, JobConfig, INDEXING_JOB_COLUMNS};
use crate::sink::{TableName, TableNameError};

/// Fields left `None` keep their stored value; at least one must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateJobCommand {
    #[serde(skip)]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<JobConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateJobError {
    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
    #[error("{0}")]
    InvalidName(#[from] NameValidationError),
    #[error("Invalid table name: {0}")]
    InvalidTableName(#[from] TableNameError),
    #[error("Indexing job {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl UpdateJobCommand {
    pub fn validate(&self) -> Result<(), UpdateJobError> {
        if self.name.is_none() && self.config.is_none() {
            return Err(UpdateJobError::NoFieldsToUpdate);
        }
        if let Some(ref name) = self.name {
            validate_name(name, MAX_NAME_LENGTH)?;
        }
        if let Some(ref config) = self.config {
            TableName::parse(&config.table_name)?;
        }
        Ok(())
    }
}

/// Config changes apply to tasks processed after the update; rows already
/// written stay in the previous table.
#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, command: UpdateJobCommand) -> Result<IndexingJob, UpdateJobError> {
    command.validate()?;

    let job = sqlx::query_as::<_, IndexingJob>(&format!(
        "UPDATE indexing_jobs
         SET name = COALESCE($2, name),
             config = COALESCE($3, config),
             updated_at = NOW()
         WHERE id = $1
         RETURNING {INDEXING_JOB_COLUMNS}"
    ))
    .bind(command.id)
    .bind(command.name.as_deref().map(str::trim))
    .bind(command.config.as_ref().map(Json))
    .fetch_optional(&pool)
    .await?
    .ok_or(UpdateJobError::NotFound(command.id))?;

    tracing::info!(job_id = %job.id, "Indexing job updated");
    Ok(job)
}
