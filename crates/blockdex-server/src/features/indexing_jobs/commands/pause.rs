//! Pause an active job

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::current_status;
use crate::models::{IndexingJob, INDEXING_JOB_COLUMNS};
use crate::provider::WebhookProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseJobCommand {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum PauseJobError {
    #[error("Indexing job {0} not found")]
    NotFound(Uuid),
    #[error("Cannot pause job {id}: status is {status}, expected active")]
    Conflict { id: Uuid, status: String },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// `active → paused`. The upstream subscription is paused afterwards; a
/// provider failure there does not undo the transition.
#[tracing::instrument(skip(pool, provider))]
pub async fn handle(
    pool: PgPool,
    provider: &dyn WebhookProvider,
    command: PauseJobCommand,
) -> Result<IndexingJob, PauseJobError> {
    let job = sqlx::query_as::<_, IndexingJob>(&format!(
        "UPDATE indexing_jobs
         SET status = 'paused', updated_at = NOW()
         WHERE id = $1 AND status = 'active'
         RETURNING {INDEXING_JOB_COLUMNS}"
    ))
    .bind(command.id)
    .fetch_optional(&pool)
    .await?;

    let Some(job) = job else {
        return match current_status(&pool, command.id).await? {
            Some(status) => Err(PauseJobError::Conflict {
                id: command.id,
                status,
            }),
            None => Err(PauseJobError::NotFound(command.id)),
        };
    };

    if let Some(webhook_id) = job.webhook_id.as_deref() {
        if let Err(e) = provider.pause_subscription(webhook_id).await {
            tracing::warn!(job_id = %job.id, webhook_id, error = %e, "Failed to pause upstream subscription");
        }
    }

    tracing::info!(job_id = %job.id, "Indexing job paused");
    Ok(job)
}
