//! Ingestion gateway for pushed webhook deliveries
//!
//! Every delivery is written to the audit log before anything else. Failures
//! never propagate to the caller: delivery providers only see an ack body,
//! and the HTTP status is always 200.

use blockdex_common::WebhookEventStatus;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::record_event::{self, RecordEventCommand};
use crate::features::indexing_jobs::queries::get::{self, GetJobError, GetJobQuery};
use crate::models::DIRECT_DELIVERY_WEBHOOK_ID;
use crate::queue::{IndexingTask, TaskQueue};

pub const SKIPPED: &str = "skipped";

/// Path id is kept as received text so malformed ids are still audited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveWebhookCommand {
    pub job_id: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookAck {
    fn accepted() -> Self {
        Self {
            success: true,
            status: None,
            error: None,
        }
    }

    fn skipped() -> Self {
        Self {
            success: true,
            status: Some(SKIPPED.to_string()),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            status: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ReceiveError {
    #[error("Indexing job not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Audit(#[from] record_event::RecordEventError),
    #[error("{0}")]
    Lookup(sqlx::Error),
    #[error("{0}")]
    Queue(#[from] crate::queue::QueueError),
}

#[tracing::instrument(skip(pool, queue, command), fields(job_id = %command.job_id))]
pub async fn handle(pool: PgPool, queue: &dyn TaskQueue, command: ReceiveWebhookCommand) -> WebhookAck {
    match receive(&pool, queue, &command).await {
        Ok(ack) => ack,
        Err(err) => {
            let message = err.to_string();
            tracing::error!(error = %message, "Webhook delivery failed");

            let audit = record_event::handle(
                pool,
                RecordEventCommand {
                    webhook_id: DIRECT_DELIVERY_WEBHOOK_ID.to_string(),
                    indexing_job_id: command.job_id,
                    payload: command.payload,
                    status: WebhookEventStatus::Error,
                    error: Some(message.clone()),
                },
            )
            .await;
            if let Err(e) = audit {
                tracing::error!(error = %e, "Failed to record webhook error event");
            }

            WebhookAck::failed(message)
        },
    }
}

async fn receive(
    pool: &PgPool,
    queue: &dyn TaskQueue,
    command: &ReceiveWebhookCommand,
) -> Result<WebhookAck, ReceiveError> {
    record_event::handle(
        pool.clone(),
        RecordEventCommand {
            webhook_id: DIRECT_DELIVERY_WEBHOOK_ID.to_string(),
            indexing_job_id: command.job_id.clone(),
            payload: command.payload.clone(),
            status: WebhookEventStatus::Received,
            error: None,
        },
    )
    .await?;

    let job_id = Uuid::parse_str(&command.job_id)
        .map_err(|_| ReceiveError::NotFound(command.job_id.clone()))?;

    let job = get::handle(pool.clone(), GetJobQuery { id: job_id })
        .await
        .map_err(|e| match e {
            GetJobError::NotFound(_) => ReceiveError::NotFound(command.job_id.clone()),
            GetJobError::Database(e) => ReceiveError::Lookup(e),
        })?;

    if !job.status.accepts_events() {
        tracing::info!(status = %job.status, "Skipping delivery for job that is not active");
        return Ok(WebhookAck::skipped());
    }

    queue
        .enqueue(IndexingTask::process_webhook_event(job_id, command.payload.clone()))
        .await?;

    Ok(WebhookAck::accepted())
}
