//! Re-check connectivity of a saved tenant store

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{check_and_record, fetch};
use crate::models::DatabaseConfig;
use crate::sink::SinkConnector;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConnectionCommand {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum TestConnectionError {
    #[error("Database config {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// An unreachable store is a successful call that reports `status = error`.
#[tracing::instrument(skip(pool, connector))]
pub async fn handle(
    pool: PgPool,
    connector: &dyn SinkConnector,
    command: TestConnectionCommand,
) -> Result<DatabaseConfig, TestConnectionError> {
    let config = fetch(&pool, command.id)
        .await?
        .ok_or(TestConnectionError::NotFound(command.id))?;

    Ok(check_and_record(&pool, connector, &config).await?)
}
