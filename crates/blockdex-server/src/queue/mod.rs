//! Persistent task queue
//!
//! Gateway and registry enqueue [`IndexingTask`]s through [`TaskQueue`];
//! [`scheduler::WorkerPool`] drains them into the pipeline. The production
//! queue is apalis backed by the service database, so tasks survive restarts.

use apalis::prelude::*;
use apalis_postgres::PostgresStorage;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};

pub mod scheduler;
pub mod tasks;

pub use scheduler::WorkerPool;
pub use tasks::IndexingTask;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Failed to prepare queue storage: {0}")]
    Setup(#[from] sqlx::Error),

    #[error("Failed to enqueue {kind} task: {message}")]
    Push { kind: &'static str, message: String },
}

#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, task: IndexingTask) -> Result<(), QueueError>;
}

/// apalis postgres storage shared by producers and workers
#[derive(Clone)]
pub struct ApalisTaskQueue {
    storage: PostgresStorage<IndexingTask>,
}

impl ApalisTaskQueue {
    /// Create the apalis tables if needed and bind storage to the pool
    pub async fn setup(pool: &PgPool) -> Result<Self, QueueError> {
        PostgresStorage::setup(pool).await?;
        info!("Task queue storage ready");
        Ok(Self {
            storage: PostgresStorage::new(pool),
        })
    }

    pub fn storage(&self) -> PostgresStorage<IndexingTask> {
        self.storage.clone()
    }
}

#[async_trait]
impl TaskQueue for ApalisTaskQueue {
    #[tracing::instrument(skip(self, task), fields(kind = task.kind(), job_id = %task.job_id()))]
    async fn enqueue(&self, task: IndexingTask) -> Result<(), QueueError> {
        let kind = task.kind();
        let mut storage = self.storage.clone();
        storage.push(task).await.map_err(|e| QueueError::Push {
            kind,
            message: e.to_string(),
        })?;
        debug!("Task enqueued");
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory queue for tests

    use super::*;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    pub struct RecordingQueue {
        tasks: Mutex<Vec<IndexingTask>>,
        unavailable: bool,
    }

    impl RecordingQueue {
        pub fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Default::default()
            }
        }

        pub fn tasks(&self) -> Vec<IndexingTask> {
            self.tasks.lock().map(|t| t.clone()).unwrap_or_default()
        }

        pub fn job_ids(&self) -> Vec<Uuid> {
            self.tasks().iter().map(IndexingTask::job_id).collect()
        }
    }

    #[async_trait]
    impl TaskQueue for RecordingQueue {
        async fn enqueue(&self, task: IndexingTask) -> Result<(), QueueError> {
            if self.unavailable {
                return Err(QueueError::Push {
                    kind: task.kind(),
                    message: "queue unavailable".to_string(),
                });
            }
            if let Ok(mut tasks) = self.tasks.lock() {
                tasks.push(task);
            }
            Ok(())
        }
    }
}
