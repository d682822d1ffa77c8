//! Job Registry: CRUD and lifecycle transitions of indexing jobs

pub mod commands;
pub mod queries;
pub mod registry;
pub mod routes;

pub use registry::{JobRegistry, PgJobRegistry, RegistryError};
pub use routes::indexing_jobs_routes;
