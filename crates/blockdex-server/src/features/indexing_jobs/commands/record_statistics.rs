//! Record the outcome of one processing attempt
//!
//! The single mutation point for counters, status and error during
//! processing. Everything happens in one `UPDATE`, so concurrent tasks for
//! the same job never lose counter increments:
//!
//! | stored status | with error            | without error          |
//! |---------------|-----------------------|------------------------|
//! | pending       | error, message set    | unchanged              |
//! | active        | error, message set    | unchanged, error clear |
//! | error         | error, message set    | active, error cleared  |
//! | paused        | unchanged             | unchanged              |

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{IndexingJob, INDEXING_JOB_COLUMNS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordStatisticsCommand {
    pub id: Uuid,
    pub records_added: i64,
    pub processing_time_ms: i64,
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordStatisticsError {
    #[error("Indexing job {0} not found")]
    NotFound(Uuid),
    #[error("Records added must not be negative, got {0}")]
    NegativeRecords(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RecordStatisticsCommand {
    pub fn validate(&self) -> Result<(), RecordStatisticsError> {
        if self.records_added < 0 {
            return Err(RecordStatisticsError::NegativeRecords(self.records_added));
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool), fields(job_id = %command.id))]
pub async fn handle(
    pool: PgPool,
    command: RecordStatisticsCommand,
) -> Result<IndexingJob, RecordStatisticsError> {
    command.validate()?;

    // An empty message would break the error-carries-message invariant
    let error = command
        .error
        .as_deref()
        .map(|e| if e.trim().is_empty() { "Unknown error" } else { e });

    let job = sqlx::query_as::<_, IndexingJob>(&format!(
        "UPDATE indexing_jobs
         SET records_indexed = records_indexed + $2,
             last_sync_at = NOW(),
             last_processing_time_ms = $3,
             status = CASE
                 WHEN status = 'paused' THEN status
                 WHEN $4::text IS NOT NULL THEN 'error'
                 WHEN status = 'error' THEN 'active'
                 ELSE status
             END,
             error = CASE WHEN status = 'paused' THEN error ELSE $4::text END,
             updated_at = NOW()
         WHERE id = $1
         RETURNING {INDEXING_JOB_COLUMNS}"
    ))
    .bind(command.id)
    .bind(command.records_added)
    .bind(command.processing_time_ms)
    .bind(error)
    .fetch_optional(&pool)
    .await?
    .ok_or(RecordStatisticsError::NotFound(command.id))?;

    tracing::debug!(
        records = command.records_added,
        status = %job.status,
        total = job.records_indexed,
        "Recorded processing statistics"
    );

    Ok(job)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{insert_database_config, insert_job};
    use blockdex_common::{JobStatus, JobType};

    fn command(id: Uuid, records_added: i64, error: Option<&str>) -> RecordStatisticsCommand {
        RecordStatisticsCommand {
            id,
            records_added,
            processing_time_ms: 42,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_negative_records_rejected() {
        let result = command(Uuid::new_v4(), -1, None).validate();
        assert!(matches!(result, Err(RecordStatisticsError::NegativeRecords(-1))));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_success_accumulates_and_clears_error(pool: PgPool) -> sqlx::Result<()> {
        let config_id = insert_database_config(&pool, "warehouse").await?;
        let job = insert_job(&pool, config_id, JobType::NftBids, JobStatus::Error, None).await?;
        assert!(job.error.is_some());

        let first = handle(pool.clone(), command(job.id, 3, None)).await.unwrap();
        assert_eq!(first.status, JobStatus::Active);
        assert!(first.error.is_none());
        assert_eq!(first.records_indexed, 3);
        assert_eq!(first.last_processing_time_ms, Some(42));
        assert!(first.last_sync_at.is_some());

        let second = handle(pool.clone(), command(job.id, 2, None)).await.unwrap();
        assert_eq!(second.records_indexed, 5);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_failure_moves_active_to_error(pool: PgPool) -> sqlx::Result<()> {
        let config_id = insert_database_config(&pool, "warehouse").await?;
        let job = insert_job(&pool, config_id, JobType::NftBids, JobStatus::Active, None).await?;

        let failed = handle(pool.clone(), command(job.id, 0, Some("connection refused")))
            .await
            .unwrap();
        assert_eq!(failed.status, JobStatus::Error);
        assert_eq!(failed.error.as_deref(), Some("connection refused"));
        assert_eq!(failed.records_indexed, 0);

        let blank = handle(pool.clone(), command(job.id, 0, Some(""))).await.unwrap();
        assert_eq!(blank.error.as_deref(), Some("Unknown error"));
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_paused_job_never_enters_error(pool: PgPool) -> sqlx::Result<()> {
        let config_id = insert_database_config(&pool, "warehouse").await?;
        let job = insert_job(&pool, config_id, JobType::NftBids, JobStatus::Paused, None).await?;

        let updated = handle(pool.clone(), command(job.id, 1, Some("late failure")))
            .await
            .unwrap();
        assert_eq!(updated.status, JobStatus::Paused);
        assert!(updated.error.is_none());
        assert_eq!(updated.records_indexed, 1);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_pending_failure_and_missing_job(pool: PgPool) -> sqlx::Result<()> {
        let config_id = insert_database_config(&pool, "warehouse").await?;
        let job = insert_job(&pool, config_id, JobType::NftPrices, JobStatus::Pending, None).await?;

        let failed = handle(pool.clone(), command(job.id, 0, Some("boom"))).await.unwrap();
        assert_eq!(failed.status, JobStatus::Error);

        let missing = handle(pool, command(Uuid::new_v4(), 0, None)).await;
        assert!(matches!(missing, Err(RecordStatisticsError::NotFound(_))));
        Ok(())
    }
}
