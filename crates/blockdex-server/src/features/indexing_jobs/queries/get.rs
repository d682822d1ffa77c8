use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{IndexingJob, INDEXING_JOB_COLUMNS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetJobQuery {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum GetJobError {
    #[error("Indexing job {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: GetJobQuery) -> Result<IndexingJob, GetJobError> {
    sqlx::query_as::<_, IndexingJob>(&format!(
        "SELECT {INDEXING_JOB_COLUMNS} FROM indexing_jobs WHERE id = $1"
    ))
    .bind(query.id)
    .fetch_optional(&pool)
    .await?
    .ok_or(GetJobError::NotFound(query.id))
}
