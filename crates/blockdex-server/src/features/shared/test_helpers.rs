//! Fixtures for database-backed tests

use blockdex_common::{JobStatus, JobType};
use serde_json::json;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::models::{IndexingJob, JobConfig, INDEXING_JOB_COLUMNS};

/// Insert a tenant store descriptor pointing nowhere reachable
pub async fn insert_database_config(pool: &PgPool, name: &str) -> sqlx::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO database_configs (id, name, host, port, username, password, database_name, ssl)
         VALUES ($1, $2, '127.0.0.1', 1, 'indexer', 'secret', 'chain', FALSE)",
    )
    .bind(id)
    .bind(name)
    .execute(pool)
    .await?;
    Ok(id)
}

pub fn job_config(table_name: &str) -> JobConfig {
    serde_json::from_value(json!({ "tableName": table_name })).unwrap_or_default()
}

/// Insert a job directly in the given state, bypassing provisioning
pub async fn insert_job(
    pool: &PgPool,
    database_config_id: Uuid,
    job_type: JobType,
    status: JobStatus,
    webhook_id: Option<&str>,
) -> sqlx::Result<IndexingJob> {
    let error = (status == JobStatus::Error).then_some("previous failure");
    sqlx::query_as::<_, IndexingJob>(&format!(
        "INSERT INTO indexing_jobs (id, name, job_type, config, status, database_config_id, webhook_id, error)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {INDEXING_JOB_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(format!("{job_type} job"))
    .bind(job_type.as_str())
    .bind(Json(job_config("bids")))
    .bind(status.as_str())
    .bind(database_config_id)
    .bind(webhook_id)
    .bind(error)
    .fetch_one(pool)
    .await
}

pub async fn fetch_job(pool: &PgPool, id: Uuid) -> sqlx::Result<IndexingJob> {
    sqlx::query_as::<_, IndexingJob>(&format!(
        "SELECT {INDEXING_JOB_COLUMNS} FROM indexing_jobs WHERE id = $1"
    ))
    .bind(id)
    .fetch_one(pool)
    .await
}
