//! Database config HTTP routes
//!
//! - `GET|POST /api/v1/database-configs`
//! - `GET|PUT|DELETE /api/v1/database-configs/:id`
//! - `POST /api/v1/database-configs/:id/test`

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
    self, CreateDatabaseConfigCommand, CreateDatabaseConfigError, DeleteDatabaseConfigCommand,
    DeleteDatabaseConfigError, TestConnectionCommand, TestConnectionError,
    UpdateDatabaseConfigCommand, UpdateDatabaseConfigError,
};
use super::queries::{
    self, GetDatabaseConfigError, GetDatabaseConfigQuery, ListDatabaseConfigsError,
    ListDatabaseConfigsQuery,
};
use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::features::FeatureState;

pub fn database_configs_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", post(create_config).get(list_configs))
        .route("/:id", get(get_config).put(update_config).delete(delete_config))
        .route("/:id/test", post(test_config))
}

#[tracing::instrument(skip(state, command), fields(name = %command.name))]
async fn create_config(
    State(state): State<FeatureState>,
    Json(command): Json<CreateDatabaseConfigCommand>,
) -> Result<Response, AppError> {
    let config =
        commands::create::handle(state.db.clone(), state.connector.as_ref(), command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(config))).into_response())
}

async fn list_configs(
    State(state): State<FeatureState>,
    Query(query): Query<ListDatabaseConfigsQuery>,
) -> Result<Response, AppError> {
    let response = queries::list::handle(state.db.clone(), query).await?;
    let meta = json!({ "pagination": response.pagination });
    Ok((StatusCode::OK, Json(ApiResponse::success_with_meta(response.items, meta))).into_response())
}

async fn get_config(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let config = queries::get::handle(state.db.clone(), GetDatabaseConfigQuery { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(config))).into_response())
}

#[tracing::instrument(skip(state, command))]
async fn update_config(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
    Json(mut command): Json<UpdateDatabaseConfigCommand>,
) -> Result<Response, AppError> {
    command.id = id;
    let config =
        commands::update::handle(state.db.clone(), state.connector.as_ref(), command).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(config))).into_response())
}

#[tracing::instrument(skip(state))]
async fn delete_config(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let response =
        commands::delete::handle(state.db.clone(), DeleteDatabaseConfigCommand { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state))]
async fn test_config(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let config = commands::test_connection::handle(
        state.db.clone(),
        state.connector.as_ref(),
        TestConnectionCommand { id },
    )
    .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(config))).into_response())
}

impl From<CreateDatabaseConfigError> for AppError {
    fn from(err: CreateDatabaseConfigError) -> Self {
        match err {
            CreateDatabaseConfigError::InvalidName(_) | CreateDatabaseConfigError::Validation(_) => {
                AppError::Validation(err.to_string())
            },
            CreateDatabaseConfigError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<UpdateDatabaseConfigError> for AppError {
    fn from(err: UpdateDatabaseConfigError) -> Self {
        match err {
            UpdateDatabaseConfigError::NoFieldsToUpdate
            | UpdateDatabaseConfigError::InvalidName(_)
            | UpdateDatabaseConfigError::Validation(_) => AppError::Validation(err.to_string()),
            UpdateDatabaseConfigError::NotFound(_) => AppError::NotFound(err.to_string()),
            UpdateDatabaseConfigError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<DeleteDatabaseConfigError> for AppError {
    fn from(err: DeleteDatabaseConfigError) -> Self {
        match err {
            DeleteDatabaseConfigError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeleteDatabaseConfigError::InUse(_) => AppError::Conflict(err.to_string()),
            DeleteDatabaseConfigError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<TestConnectionError> for AppError {
    fn from(err: TestConnectionError) -> Self {
        match err {
            TestConnectionError::NotFound(_) => AppError::NotFound(err.to_string()),
            TestConnectionError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<GetDatabaseConfigError> for AppError {
    fn from(err: GetDatabaseConfigError) -> Self {
        match err {
            GetDatabaseConfigError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetDatabaseConfigError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ListDatabaseConfigsError> for AppError {
    fn from(err: ListDatabaseConfigsError) -> Self {
        match err {
            ListDatabaseConfigsError::Database(e) => AppError::Database(e),
        }
    }
}
