//! Indexing job HTTP routes
//!
//! - `POST /api/v1/indexing-jobs` - create and provision a job
//! - `GET /api/v1/indexing-jobs` - list with `page`, `per_page`, `status`, `type`
//! - `GET|PUT|DELETE /api/v1/indexing-jobs/:id`
//! - `POST /api/v1/indexing-jobs/:id/pause` and `/resume`
//! - `GET /api/v1/indexing-jobs/:id/events` - webhook audit log

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use super::commands::{
    self, CreateJobCommand, CreateJobError, DeleteJobCommand, DeleteJobError, PauseJobCommand,
    PauseJobError, ResumeJobCommand, ResumeJobError, UpdateJobCommand, UpdateJobError,
};
use super::queries::{
    self, GetJobError, GetJobQuery, ListJobEventsError, ListJobEventsQuery, ListJobsError,
    ListJobsQuery,
};
use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::features::FeatureState;

pub fn indexing_jobs_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", post(create_job).get(list_jobs))
        .route("/:id", get(get_job).put(update_job).delete(delete_job))
        .route("/:id/pause", post(pause_job))
        .route("/:id/resume", post(resume_job))
        .route("/:id/events", get(list_job_events))
}

#[tracing::instrument(skip(state, command), fields(name = %command.name))]
async fn create_job(
    State(state): State<FeatureState>,
    Json(command): Json<CreateJobCommand>,
) -> Result<Response, AppError> {
    let job = commands::create::handle(
        state.db.clone(),
        state.provider.as_ref(),
        state.queue.as_ref(),
        command,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(job))).into_response())
}

async fn list_jobs(
    State(state): State<FeatureState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Response, AppError> {
    let response = queries::list::handle(state.db.clone(), query).await?;
    let meta = json!({ "pagination": response.pagination });
    Ok((StatusCode::OK, Json(ApiResponse::success_with_meta(response.items, meta))).into_response())
}

async fn get_job(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let job = queries::get::handle(state.db.clone(), GetJobQuery { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(job))).into_response())
}

#[tracing::instrument(skip(state, command))]
async fn update_job(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
    Json(mut command): Json<UpdateJobCommand>,
) -> Result<Response, AppError> {
    command.id = id;
    let job = commands::update::handle(state.db.clone(), command).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(job))).into_response())
}

#[tracing::instrument(skip(state))]
async fn delete_job(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let response =
        commands::delete::handle(state.db.clone(), state.provider.as_ref(), DeleteJobCommand { id })
            .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state))]
async fn pause_job(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let job =
        commands::pause::handle(state.db.clone(), state.provider.as_ref(), PauseJobCommand { id })
            .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(job))).into_response())
}

#[tracing::instrument(skip(state))]
async fn resume_job(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let job =
        commands::resume::handle(state.db.clone(), state.provider.as_ref(), ResumeJobCommand { id })
            .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(job))).into_response())
}

async fn list_job_events(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
    Query(mut query): Query<ListJobEventsQuery>,
) -> Result<Response, AppError> {
    query.job_id = id;
    let response = queries::list_events::handle(state.db.clone(), query).await?;
    let meta = json!({ "pagination": response.pagination });
    Ok((StatusCode::OK, Json(ApiResponse::success_with_meta(response.items, meta))).into_response())
}

impl From<CreateJobError> for AppError {
    fn from(err: CreateJobError) -> Self {
        match err {
            CreateJobError::InvalidName(_)
            | CreateJobError::InvalidType(_)
            | CreateJobError::InvalidTableName(_) => AppError::Validation(err.to_string()),
            CreateJobError::DatabaseConfigNotFound(_) => AppError::NotFound(err.to_string()),
            CreateJobError::Webhook(_) => AppError::Conflict(err.to_string()),
            CreateJobError::Queue(_) => AppError::Internal(err.to_string()),
            CreateJobError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<UpdateJobError> for AppError {
    fn from(err: UpdateJobError) -> Self {
        match err {
            UpdateJobError::NoFieldsToUpdate
            | UpdateJobError::InvalidName(_)
            | UpdateJobError::InvalidTableName(_) => AppError::Validation(err.to_string()),
            UpdateJobError::NotFound(_) => AppError::NotFound(err.to_string()),
            UpdateJobError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<DeleteJobError> for AppError {
    fn from(err: DeleteJobError) -> Self {
        match err {
            DeleteJobError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeleteJobError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<PauseJobError> for AppError {
    fn from(err: PauseJobError) -> Self {
        match err {
            PauseJobError::NotFound(_) => AppError::NotFound(err.to_string()),
            PauseJobError::Conflict { .. } => AppError::Conflict(err.to_string()),
            PauseJobError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ResumeJobError> for AppError {
    fn from(err: ResumeJobError) -> Self {
        match err {
            ResumeJobError::NotFound(_) => AppError::NotFound(err.to_string()),
            ResumeJobError::Conflict { .. } => AppError::Conflict(err.to_string()),
            ResumeJobError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<GetJobError> for AppError {
    fn from(err: GetJobError) -> Self {
        match err {
            GetJobError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetJobError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ListJobsError> for AppError {
    fn from(err: ListJobsError) -> Self {
        match err {
            ListJobsError::InvalidStatus(_) | ListJobsError::InvalidType(_) => {
                AppError::BadRequest(err.to_string())
            },
            ListJobsError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ListJobEventsError> for AppError {
    fn from(err: ListJobEventsError) -> Self {
        match err {
            ListJobEventsError::Database(e) => AppError::Database(e),
        }
    }
}
