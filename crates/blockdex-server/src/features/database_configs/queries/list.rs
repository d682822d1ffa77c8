use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::{PaginationMetadata, PaginationParams};
use crate::models::{DatabaseConfig, DATABASE_CONFIG_COLUMNS};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDatabaseConfigsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListDatabaseConfigsResponse {
    pub items: Vec<DatabaseConfig>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListDatabaseConfigsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListDatabaseConfigsQuery,
) -> Result<ListDatabaseConfigsResponse, ListDatabaseConfigsError> {
    let pagination = PaginationParams::new(query.page, query.per_page);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM database_configs")
        .fetch_one(&pool)
        .await?;

    let items = sqlx::query_as::<_, DatabaseConfig>(&format!(
        "SELECT {DATABASE_CONFIG_COLUMNS} FROM database_configs
         ORDER BY created_at DESC, id DESC
         LIMIT $1 OFFSET $2"
    ))
    .bind(pagination.per_page())
    .bind(pagination.offset())
    .fetch_all(&pool)
    .await?;

    Ok(ListDatabaseConfigsResponse {
        items,
        pagination: PaginationMetadata::new(&pagination, total),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::insert_database_config;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_list(pool: PgPool) -> sqlx::Result<()> {
        insert_database_config(&pool, "first").await?;
        insert_database_config(&pool, "second").await?;

        let response = handle(pool, ListDatabaseConfigsQuery::default()).await.unwrap();
        assert_eq!(response.pagination.total, 2);
        assert_eq!(response.items.len(), 2);
        Ok(())
    }
}
