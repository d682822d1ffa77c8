//! Task definitions for the indexing queue
//!
//! Tasks are serialized into the apalis postgres queue, so their JSON shape
//! is a storage format: variants are tagged by `kind`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum IndexingTask {
    /// One per newly provisioned job: load the backfill and activate
    InitialDataFetch {
        job_id: Uuid,
        enqueued_at: DateTime<Utc>,
    },
    /// One per accepted webhook delivery
    ProcessWebhookEvent {
        job_id: Uuid,
        payload: serde_json::Value,
        enqueued_at: DateTime<Utc>,
    },
}

impl IndexingTask {
    pub fn initial_data_fetch(job_id: Uuid) -> Self {
        Self::InitialDataFetch {
            job_id,
            enqueued_at: Utc::now(),
        }
    }

    pub fn process_webhook_event(job_id: Uuid, payload: serde_json::Value) -> Self {
        Self::ProcessWebhookEvent {
            job_id,
            payload,
            enqueued_at: Utc::now(),
        }
    }

    pub fn job_id(&self) -> Uuid {
        match self {
            Self::InitialDataFetch { job_id, .. } | Self::ProcessWebhookEvent { job_id, .. } => {
                *job_id
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitialDataFetch { .. } => "initial-data-fetch",
            Self::ProcessWebhookEvent { .. } => "process-webhook-event",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_is_tagged_by_kind() {
        let job_id = Uuid::new_v4();
        let task = IndexingTask::process_webhook_event(job_id, json!([{"type": "NFT_BID"}]));

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["kind"], "process-webhook-event");
        assert_eq!(value["job_id"], job_id.to_string());
        assert_eq!(value["payload"][0]["type"], "NFT_BID");
        assert_eq!(task.kind(), "process-webhook-event");
    }

    #[test]
    fn test_initial_fetch_shape() {
        let job_id = Uuid::new_v4();
        let value = serde_json::to_value(IndexingTask::initial_data_fetch(job_id)).unwrap();
        assert_eq!(value["kind"], "initial-data-fetch");

        let back: IndexingTask = serde_json::from_value(value).unwrap();
        assert_eq!(back.job_id(), job_id);
    }
}
