pub mod course;
pub mod lifecycle;

use lectern_core::course::Course;
use lectern_core::error::CoreError;
use lectern_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Fetch a course or fail with 404.
pub(crate) async fn load_course(state: &AppState, id: DbId) -> AppResult<Course> {
    state
        .store
        .find_course(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Course",
            id,
        }))
}
