pub mod get;
pub mod list;
pub mod list_events;

pub use get::{GetJobError, GetJobQuery};
pub use list::{ListJobsError, ListJobsQuery, ListJobsResponse};
pub use list_events::{ListJobEventsError, ListJobEventsQuery, ListJobEventsResponse};
