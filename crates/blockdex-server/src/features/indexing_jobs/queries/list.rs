//! List jobs, newest first, optionally filtered by status and type

use blockdex_common::{JobStatus, JobType};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::features::shared::{PaginationMetadata, PaginationParams};
use crate::models::{IndexingJob, INDEXING_JOB_COLUMNS};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListJobsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListJobsResponse {
    pub items: Vec<IndexingJob>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListJobsError {
    #[error("Invalid status filter: {0}")]
    InvalidStatus(String),
    #[error("Unsupported indexing type: {0}")]
    InvalidType(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ListJobsQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }

    fn filters(&self) -> Result<(Option<JobStatus>, Option<JobType>), ListJobsError> {
        let status = self
            .status
            .as_deref()
            .map(|s| {
                JobStatus::try_from(s.to_string()).map_err(|_| ListJobsError::InvalidStatus(s.to_string()))
            })
            .transpose()?;
        let job_type = self
            .job_type
            .as_deref()
            .map(|t| t.parse::<JobType>().map_err(|_| ListJobsError::InvalidType(t.to_string())))
            .transpose()?;
        Ok((status, job_type))
    }
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    status: Option<JobStatus>,
    job_type: Option<JobType>,
) {
    builder.push(" WHERE 1=1");
    if let Some(status) = status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(job_type) = job_type {
        builder.push(" AND job_type = ").push_bind(job_type.as_str());
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: ListJobsQuery) -> Result<ListJobsResponse, ListJobsError> {
    let (status, job_type) = query.filters()?;
    let pagination = query.pagination();

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM indexing_jobs");
    push_filters(&mut count, status, job_type);
    let total: i64 = count.build_query_scalar().fetch_one(&pool).await?;

    let mut select =
        QueryBuilder::<Postgres>::new(format!("SELECT {INDEXING_JOB_COLUMNS} FROM indexing_jobs"));
    push_filters(&mut select, status, job_type);
    select
        .push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(pagination.per_page())
        .push(" OFFSET ")
        .push_bind(pagination.offset());

    let items = select.build_query_as::<IndexingJob>().fetch_all(&pool).await?;

    Ok(ListJobsResponse {
        items,
        pagination: PaginationMetadata::new(&pagination, total),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{insert_database_config, insert_job};

    #[test]
    fn test_invalid_filters() {
        let query = ListJobsQuery {
            status: Some("running".into()),
            ..Default::default()
        };
        assert!(matches!(query.filters(), Err(ListJobsError::InvalidStatus(_))));

        let query = ListJobsQuery {
            job_type: Some("nft_mints".into()),
            ..Default::default()
        };
        assert!(matches!(query.filters(), Err(ListJobsError::InvalidType(_))));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_list_filters_and_paginates(pool: PgPool) -> sqlx::Result<()> {
        let config_id = insert_database_config(&pool, "warehouse").await?;
        insert_job(&pool, config_id, JobType::NftBids, JobStatus::Active, None).await?;
        insert_job(&pool, config_id, JobType::NftBids, JobStatus::Paused, None).await?;
        insert_job(&pool, config_id, JobType::TokenPrices, JobStatus::Active, None).await?;

        let all = handle(pool.clone(), ListJobsQuery::default()).await.unwrap();
        assert_eq!(all.pagination.total, 3);
        assert_eq!(all.items.len(), 3);

        let active_bids = handle(
            pool.clone(),
            ListJobsQuery {
                status: Some("active".into()),
                job_type: Some("nft_bids".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(active_bids.items.len(), 1);

        let page = handle(
            pool,
            ListJobsQuery {
                page: Some(2),
                per_page: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.pagination.has_prev);
        assert!(!page.pagination.has_next);
        Ok(())
    }
}
