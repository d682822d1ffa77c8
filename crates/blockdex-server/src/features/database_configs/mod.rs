//! Tenant store descriptors and their connectivity checks

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::database_configs_routes;
