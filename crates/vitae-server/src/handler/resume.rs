//! Resume workflow submission handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use vitae_core::model::JobPosting;
use vitae_core::task::TaskRequest;
use vitae_core::{ErrorKind, TaskKind};

use super::error::{Error, Result};
use super::request::{ExportRequest, ScreenshotRequest, TailorRequest, ValidateJson};
use super::response::AsyncAccepted;
use crate::service::ServiceState;

/// `POST /api/v1/resume/tailor`
pub(super) async fn submit_tailor(
    State(state): State<ServiceState>,
    ValidateJson(request): ValidateJson<TailorRequest>,
) -> Result<(StatusCode, Json<AsyncAccepted>)> {
    if state.tailor().is_none() {
        return Err(Error::new(
            ErrorKind::ConfigurationError,
            "no tailoring provider configured",
        ));
    }

    let resume = request.base_resume.clone().into_resume()?;
    let posting = JobPosting {
        title: Some(request.job.title.clone()),
        company_name: Some(request.job.company_name.clone()),
        location: request.job.location.clone(),
        description: request.job.description.clone().unwrap_or_default(),
        ..Default::default()
    };

    let task_request = TaskRequest::Tailor {
        resume_id: request.resume_id.clone(),
        job_title: request.job.title.clone(),
        company_name: request.job.company_name.clone(),
    };

    let executor_state = state.clone();
    let resume_id = request.resume_id.clone();
    let process_id = state.tasks().submit(TaskKind::Tailor, task_request, async move {
        executor_state
            .execute_tailor(resume, posting, resume_id)
            .await
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(AsyncAccepted::new(
            process_id,
            "resume tailoring accepted for processing",
        )),
    ))
}

/// `POST /api/v1/resume/screenshot`
pub(super) async fn submit_screenshot(
    State(state): State<ServiceState>,
    ValidateJson(request): ValidateJson<ScreenshotRequest>,
) -> Result<(StatusCode, Json<AsyncAccepted>)> {
    if state.renderer().is_none() {
        return Err(Error::new(
            ErrorKind::ConfigurationError,
            "no screenshot renderer configured",
        ));
    }

    let task_request = TaskRequest::Screenshot {
        resume_id: request.resume_id.clone(),
    };

    let executor_state = state.clone();
    let resume_id = request.resume_id.clone();
    let process_id = state
        .tasks()
        .submit(TaskKind::Screenshot, task_request, async move {
            executor_state.execute_screenshot(resume_id).await
        });

    Ok((
        StatusCode::ACCEPTED,
        Json(AsyncAccepted::new(
            process_id,
            "screenshot generation accepted for processing",
        )),
    ))
}

/// `POST /api/v1/resume/export`
pub(super) async fn submit_export(
    State(state): State<ServiceState>,
    ValidateJson(request): ValidateJson<ExportRequest>,
) -> Result<(StatusCode, Json<AsyncAccepted>)> {
    let resume = request.resume.clone().into_resume()?;
    let theme = request.theme.clone();

    let task_request = TaskRequest::Export {
        resume_id: resume.id.clone(),
        theme: theme.clone(),
    };

    let executor_state = state.clone();
    let process_id = state.tasks().submit(TaskKind::Export, task_request, async move {
        executor_state.execute_export(resume, theme).await
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(AsyncAccepted::new(
            process_id,
            "resume export accepted for processing",
        )),
    ))
}
