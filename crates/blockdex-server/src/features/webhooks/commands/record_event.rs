//! Append an entry to the webhook audit log

use blockdex_common::WebhookEventStatus;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::models::{WebhookEvent, WEBHOOK_EVENT_COLUMNS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEventCommand {
    pub webhook_id: String,
    pub indexing_job_id: String,
    pub payload: serde_json::Value,
    pub status: WebhookEventStatus,
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordEventError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool, command), fields(job_id = %command.indexing_job_id, status = %command.status))]
pub async fn handle(pool: PgPool, command: RecordEventCommand) -> Result<WebhookEvent, RecordEventError> {
    let event = sqlx::query_as::<_, WebhookEvent>(&format!(
        "INSERT INTO webhook_events (id, webhook_id, indexing_job_id, payload, status, error)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {WEBHOOK_EVENT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&command.webhook_id)
    .bind(&command.indexing_job_id)
    .bind(Json(&command.payload))
    .bind(command.status.as_str())
    .bind(&command.error)
    .fetch_one(&pool)
    .await?;

    Ok(event)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_records_event_for_unknown_job(pool: PgPool) -> sqlx::Result<()> {
        let event = handle(
            pool,
            RecordEventCommand {
                webhook_id: "direct".into(),
                indexing_job_id: "not-a-uuid".into(),
                payload: json!([{ "type": "NFT_BID" }]),
                status: WebhookEventStatus::Error,
                error: Some("Indexing job not found: not-a-uuid".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(event.status, WebhookEventStatus::Error);
        assert_eq!(event.payload.0[0]["type"], "NFT_BID");
        Ok(())
    }
}
