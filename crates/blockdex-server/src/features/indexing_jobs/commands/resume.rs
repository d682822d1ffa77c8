//! Resume a paused job

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::current_status;
use crate::models::{IndexingJob, INDEXING_JOB_COLUMNS};
use crate::provider::WebhookProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeJobCommand {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum ResumeJobError {
    #[error("Indexing job {0} not found")]
    NotFound(Uuid),
    #[error("Cannot resume job {id}: status is {status}, expected paused")]
    Conflict { id: Uuid, status: String },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// `paused → active`, then resumes the upstream subscription (failures logged)
#[tracing::instrument(skip(pool, provider))]
pub async fn handle(
    pool: PgPool,
    provider: &dyn WebhookProvider,
    command: ResumeJobCommand,
) -> Result<IndexingJob, ResumeJobError> {
    let job = sqlx::query_as::<_, IndexingJob>(&format!(
        "UPDATE indexing_jobs
         SET status = 'active', updated_at = NOW()
         WHERE id = $1 AND status = 'paused'
         RETURNING {INDEXING_JOB_COLUMNS}"
    ))
    .bind(command.id)
    .fetch_optional(&pool)
    .await?;

    let Some(job) = job else {
        return match current_status(&pool, command.id).await? {
            Some(status) => Err(ResumeJobError::Conflict {
                id: command.id,
                status,
            }),
            None => Err(ResumeJobError::NotFound(command.id)),
        };
    };

    if let Some(webhook_id) = job.webhook_id.as_deref() {
        if let Err(e) = provider.resume_subscription(webhook_id).await {
            tracing::warn!(job_id = %job.id, webhook_id, error = %e, "Failed to resume upstream subscription");
        }
    }

    tracing::info!(job_id = %job.id, "Indexing job resumed");
    Ok(job)
}
