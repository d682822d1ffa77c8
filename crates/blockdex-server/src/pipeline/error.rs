use thiserror::Error;

use crate::features::indexing_jobs::RegistryError;
use crate::provider::ProviderError;
use crate::sink::{SinkError, TableNameError};

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Job or its database config vanished, e.g. deleted while queued
    #[error("{0}")]
    NotFound(String),

    /// Unsupported job type or an unusable job config
    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    ExternalStore(#[from] SinkError),

    #[error("Failed to fetch initial data: {0}")]
    UpstreamProvider(#[from] ProviderError),

    #[error("Registry update failed: {0}")]
    Registry(String),
}

/// What the worker does with a failed task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Report through `record_statistics` so the job shows the error
    RecordOnJob,
    /// Nothing sensible to record against; log and drop
    LogOnly,
}

impl PipelineError {
    pub fn disposition(&self) -> Disposition {
        match self {
            PipelineError::Configuration(_)
            | PipelineError::ExternalStore(_)
            | PipelineError::UpstreamProvider(_) => Disposition::RecordOnJob,
            PipelineError::NotFound(_) | PipelineError::Registry(_) => Disposition::LogOnly,
        }
    }
}

impl From<RegistryError> for PipelineError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::JobNotFound(_) | RegistryError::DatabaseConfigNotFound(_) => {
                PipelineError::NotFound(err.to_string())
            },
            RegistryError::Conflict(_) | RegistryError::Database(_) => {
                PipelineError::Registry(err.to_string())
            },
        }
    }
}

impl From<TableNameError> for PipelineError {
    fn from(err: TableNameError) -> Self {
        PipelineError::Configuration(format!("Invalid table name: {err}"))
    }
}

impl From<blockdex_common::BlockdexError> for PipelineError {
    fn from(err: blockdex_common::BlockdexError) -> Self {
        PipelineError::Configuration(err.to_string())
    }
}
