//! Delete a job and release its upstream subscription

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::provider::WebhookProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteJobCommand {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteJobResponse {
    pub id: Uuid,
    pub deleted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteJobError {
    #[error("Indexing job {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Allowed from any state. Releasing the subscription is best-effort and
/// never blocks the delete. Audit events are kept.
#[tracing::instrument(skip(pool, provider))]
pub async fn handle(
    pool: PgPool,
    provider: &dyn WebhookProvider,
    command: DeleteJobCommand,
) -> Result<DeleteJobResponse, DeleteJobError> {
    let webhook_id: Option<Option<String>> =
        sqlx::query_scalar("SELECT webhook_id FROM indexing_jobs WHERE id = $1")
            .bind(command.id)
            .fetch_optional(&pool)
            .await?;

    let Some(webhook_id) = webhook_id else {
        return Err(DeleteJobError::NotFound(command.id));
    };

    if let Some(webhook_id) = webhook_id.as_deref() {
        if let Err(e) = provider.delete_subscription(webhook_id).await {
            tracing::warn!(job_id = %command.id, webhook_id, error = %e, "Failed to delete upstream subscription");
        }
    }

    let result = sqlx::query("DELETE FROM indexing_jobs WHERE id = $1")
        .bind(command.id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DeleteJobError::NotFound(command.id));
    }

    tracing::info!(job_id = %command.id, "Indexing job deleted");
    Ok(DeleteJobResponse {
        id: command.id,
        deleted: true,
    })
}
