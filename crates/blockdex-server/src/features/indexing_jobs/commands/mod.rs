pub mod activate;
pub mod create;
pub mod delete;
pub mod pause;
pub mod record_statistics;
pub mod resume;
pub mod update;

pub use activate::{ActivateJobCommand, ActivateJobError};
pub use create::{CreateJobCommand, CreateJobError};
pub use delete::{DeleteJobCommand, DeleteJobError, DeleteJobResponse};
pub use pause::{PauseJobCommand, PauseJobError};
pub use record_statistics::{RecordStatisticsCommand, RecordStatisticsError};
pub use resume::{ResumeJobCommand, ResumeJobError};
pub use update::{UpdateJobCommand, UpdateJobError};

use sqlx::PgPool;
use uuid::Uuid;

/// Stored status of a job, `None` when it does not exist.
///
/// Used after a conditional `UPDATE` matched nothing, to tell a missing job
/// from one in the wrong state.
pub(super) async fn current_status(pool: &PgPool, id: Uuid) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT status FROM indexing_jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
