//! Activate a job once its initial backfill has completed

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::current_status;
use crate::models::{IndexingJob, INDEXING_JOB_COLUMNS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateJobCommand {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum ActivateJobError {
    #[error("Indexing job {0} not found")]
    NotFound(Uuid),
    #[error("Cannot activate job {id}: status is {status}, expected pending")]
    Conflict { id: Uuid, status: String },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// `pending → active`, clearing any error. Any other state is a conflict.
#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, command: ActivateJobCommand) -> Result<IndexingJob, ActivateJobError> {
    let job = sqlx::query_as::<_, IndexingJob>(&format!(
        "UPDATE indexing_jobs
         SET status = 'active', error = NULL, updated_at = NOW()
         WHERE id = $1 AND status = 'pending'
         RETURNING {INDEXING_JOB_COLUMNS}"
    ))
    .bind(command.id)
    .fetch_optional(&pool)
    .await?;

    match job {
        Some(job) => {
            tracing::info!(job_id = %job.id, "Indexing job activated");
            Ok(job)
        },
        None => match current_status(&pool, command.id).await? {
            Some(status) => Err(ActivateJobError::Conflict {
                id: command.id,
                status,
            }),
            None => Err(ActivateJobError::NotFound(command.id)),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{insert_database_config, insert_job};
    use blockdex_common::{JobStatus, JobType};

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_activates_pending_job(pool: PgPool) -> sqlx::Result<()> {
        let config_id = insert_database_config(&pool, "warehouse").await?;
        let job = insert_job(&pool, config_id, JobType::NftBids, JobStatus::Pending, None).await?;

        let activated = handle(pool.clone(), ActivateJobCommand { id: job.id }).await.unwrap();
        assert_eq!(activated.status, JobStatus::Active);
        assert!(activated.error.is_none());
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_rejects_non_pending(pool: PgPool) -> sqlx::Result<()> {
        let config_id = insert_database_config(&pool, "warehouse").await?;
        let job = insert_job(&pool, config_id, JobType::NftBids, JobStatus::Paused, None).await?;

        let result = handle(pool.clone(), ActivateJobCommand { id: job.id }).await;
        assert!(matches!(result, Err(ActivateJobError::Conflict { ref status, .. }) if status == "paused"));

        let missing = handle(pool, ActivateJobCommand { id: Uuid::new_v4() }).await;
        assert!(matches!(missing, Err(ActivateJobError::NotFound(_))));
        Ok(())
    }
}
