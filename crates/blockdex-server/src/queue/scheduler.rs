//! Worker pool draining the indexing queue

use apalis::prelude::*;
use apalis_postgres::PostgresStorage;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::tasks::IndexingTask;
use crate::pipeline::IndexingProcessor;

pub struct WorkerPool {
    storage: PostgresStorage<IndexingTask>,
    processor: Arc<IndexingProcessor>,
    workers: usize,
}

impl WorkerPool {
    pub fn new(
        storage: PostgresStorage<IndexingTask>,
        processor: Arc<IndexingProcessor>,
        workers: usize,
    ) -> Self {
        Self {
            storage,
            processor,
            workers: workers.max(1),
        }
    }

    /// Spawn the monitor with `workers` concurrent consumers
    pub fn start(self) -> JoinHandle<()> {
        info!(workers = self.workers, "Starting indexing workers");

        let mut monitor = Monitor::new();
        for worker in 0..self.workers {
            let storage = self.storage.clone();
            let processor = self.processor.clone();
            monitor = monitor.register(move |_index| {
                WorkerBuilder::new(format!("blockdex-indexing-worker-{worker}"))
                    .backend(storage.clone())
                    .data(processor.clone())
                    .build(handle_task)
            });
        }

        tokio::spawn(async move {
            if let Err(e) = monitor.run().await {
                error!("Indexing worker pool error: {:?}", e);
            }
            info!("Indexing workers stopped");
        })
    }
}

/// Pipeline failures are recorded on the job, never retried by the queue.
async fn handle_task(
    task: IndexingTask,
    processor: Data<Arc<IndexingProcessor>>,
) -> anyhow::Result<()> {
    processor.handle(task).await;
    Ok(())
}
