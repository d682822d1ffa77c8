//! Webhook audit log of one job, newest first

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::{PaginationMetadata, PaginationParams};
use crate::models::{WebhookEvent, WEBHOOK_EVENT_COLUMNS};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListJobEventsQuery {
    #[serde(skip)]
    pub job_id: Uuid,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListJobEventsResponse {
    pub items: Vec<WebhookEvent>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListJobEventsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Events outlive their job, so a deleted job still lists its history.
#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListJobEventsQuery,
) -> Result<ListJobEventsResponse, ListJobEventsError> {
    let pagination = PaginationParams::new(query.page, query.per_page);
    let job_id = query.job_id.to_string();

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM webhook_events WHERE indexing_job_id = $1")
            .bind(&job_id)
            .fetch_one(&pool)
            .await?;

    let items = sqlx::query_as::<_, WebhookEvent>(&format!(
        "SELECT {WEBHOOK_EVENT_COLUMNS} FROM webhook_events
         WHERE indexing_job_id = $1
         ORDER BY created_at DESC, id DESC
         LIMIT $2 OFFSET $3"
    ))
    .bind(&job_id)
    .bind(pagination.per_page())
    .bind(pagination.offset())
    .fetch_all(&pool)
    .await?;

    Ok(ListJobEventsResponse {
        items,
        pagination: PaginationMetadata::new(&pagination, total),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::features::webhooks::commands::record_event::{self, RecordEventCommand};
    use blockdex_common::WebhookEventStatus;
    use serde_json::json;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_lists_events_of_one_job(pool: PgPool) -> sqlx::Result<()> {
        let job_id = Uuid::new_v4();
        for n in 0..3 {
            record_event::handle(
                pool.clone(),
                RecordEventCommand {
                    webhook_id: "direct".into(),
                    indexing_job_id: job_id.to_string(),
                    payload: json!({ "n": n }),
                    status: WebhookEventStatus::Received,
                    error: None,
                },
            )
            .await
            .unwrap();
        }
        record_event::handle(
            pool.clone(),
            RecordEventCommand {
                webhook_id: "direct".into(),
                indexing_job_id: Uuid::new_v4().to_string(),
                payload: json!({}),
                status: WebhookEventStatus::Received,
                error: None,
            },
        )
        .await
        .unwrap();

        let page = handle(
            pool,
            ListJobEventsQuery {
                job_id,
                page: Some(1),
                per_page: Some(2),
            },
        )
        .await
        .unwrap();

        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|e| e.indexing_job_id == job_id.to_string()));
        Ok(())
    }
}
