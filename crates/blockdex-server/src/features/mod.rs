//! Feature slices of the HTTP API
//!
//! Each slice owns its `commands/` (writes), `queries/` (reads) and
//! `routes.rs`. Handlers are plain async functions taking the pool and the
//! collaborators they need, so the pipeline can call them directly too.
//!
//! - **indexing_jobs**: the Job Registry
//! - **database_configs**: tenant store descriptors
//! - **webhooks**: the ingestion gateway

pub mod database_configs;
pub mod indexing_jobs;
pub mod shared;
pub mod webhooks;

use axum::Router;
use std::sync::Arc;

use crate::provider::WebhookProvider;
use crate::queue::TaskQueue;
use crate::sink::SinkConnector;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub db: sqlx::PgPool,
    pub queue: Arc<dyn TaskQueue>,
    pub provider: Arc<dyn WebhookProvider>,
    /// Used for connectivity checks of tenant stores
    pub connector: Arc<dyn SinkConnector>,
}

/// Routes mounted under `/api/v1`
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/webhooks", webhooks::webhooks_routes())
        .nest("/indexing-jobs", indexing_jobs::indexing_jobs_routes())
        .nest("/database-configs", database_configs::database_configs_routes())
        .with_state(state)
}
