use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{DatabaseConfig, DATABASE_CONFIG_COLUMNS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDatabaseConfigQuery {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum GetDatabaseConfigError {
    #[error("Database config {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: GetDatabaseConfigQuery,
) -> Result<DatabaseConfig, GetDatabaseConfigError> {
    sqlx::query_as::<_, DatabaseConfig>(&format!(
        "SELECT {DATABASE_CONFIG_COLUMNS} FROM database_configs WHERE id = $1"
    ))
    .bind(query.id)
    .fetch_optional(&pool)
    .await?
    .ok_or(GetDatabaseConfigError::NotFound(query.id))
}
