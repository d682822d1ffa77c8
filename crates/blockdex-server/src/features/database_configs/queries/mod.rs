pub mod get;
pub mod list;

pub use get::{GetDatabaseConfigError, GetDatabaseConfigQuery};
pub use list::{ListDatabaseConfigsError, ListDatabaseConfigsQuery, ListDatabaseConfigsResponse};
