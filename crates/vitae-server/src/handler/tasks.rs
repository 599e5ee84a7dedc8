//! Task status queries.

use axum::Json;
use axum::extract::{Path, State};
use vitae_core::task::TaskRecord;
use vitae_core::{ErrorKind, ProcessId};

use super::error::{Error, Result};
use crate::service::ServiceState;

/// `GET /api/v1/tasks/{process_id}`
pub(super) async fn task_status(
    State(state): State<ServiceState>,
    Path(process_id): Path<String>,
) -> Result<Json<TaskRecord>> {
    let process_id = ProcessId::from(process_id);

    state
        .tasks()
        .status(&process_id)
        .map(Json)
        .ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("no task found for process id {process_id}"),
            )
        })
}
