//! `ResumeService` implementation.

use tonic::{Request, Response, Status};
use vitae_core::model::{JobPosting, Resume};
use vitae_core::task::TaskRequest;
use vitae_core::{ErrorKind, TaskKind};
use vitae_proto::v1::resume_service_server::ResumeService;
use vitae_proto::v1::{
    AsyncTaskResponse, ExportResumeRequest, GenerateScreenshotRequest, TailorResumeRequest,
};

use super::{accepted, failure, with_panic_barrier};
use crate::service::ServiceState;

/// gRPC front of the resume workflows.
pub struct ResumeRpc {
    state: ServiceState,
}

impl ResumeRpc {
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    async fn tailor_inner(&self, request: TailorResumeRequest) -> AsyncTaskResponse {
        if self.state.tailor().is_none() {
            return failure(
                ErrorKind::ConfigurationError,
                "no tailoring provider configured",
            );
        }

        let Some(job) = request.job else {
            return failure(ErrorKind::ValidationFailed, "job is required");
        };
        if job.title.trim().is_empty() {
            return failure(ErrorKind::ValidationFailed, "job.title is required");
        }
        if job.company_name.trim().is_empty() {
            return failure(ErrorKind::ValidationFailed, "job.company_name is required");
        }
        if request.resume_id.trim().is_empty() {
            return failure(ErrorKind::ValidationFailed, "resume_id is required");
        }

        let resume = match parse_resume(&request.base_resume_json) {
            Ok(resume) => resume,
            Err(response) => return *response,
        };

        let posting = JobPosting {
            title: Some(job.title.clone()),
            company_name: Some(job.company_name.clone()),
            location: (!job.location.is_empty()).then(|| job.location.clone()),
            description: job.description.clone(),
            ..Default::default()
        };

        let task_request = TaskRequest::Tailor {
            resume_id: request.resume_id.clone(),
            job_title: job.title,
            company_name: job.company_name,
        };

        let executor_state = self.state.clone();
        let resume_id = request.resume_id;
        let process_id =
            self.state
                .tasks()
                .submit(TaskKind::Tailor, task_request, async move {
                    executor_state
                        .execute_tailor(resume, posting, resume_id)
                        .await
                });

        accepted(&process_id, "resume tailoring accepted for processing")
    }

    async fn screenshot_inner(&self, request: GenerateScreenshotRequest) -> AsyncTaskResponse {
        if request.resume_id.trim().is_empty() {
            return failure(ErrorKind::ValidationFailed, "resume_id is required");
        }
        if self.state.renderer().is_none() {
            return failure(
                ErrorKind::ConfigurationError,
                "no screenshot renderer configured",
            );
        }

        let task_request = TaskRequest::Screenshot {
            resume_id: request.resume_id.clone(),
        };

        let executor_state = self.state.clone();
        let resume_id = request.resume_id;
        let process_id =
            self.state
                .tasks()
                .submit(TaskKind::Screenshot, task_request, async move {
                    executor_state.execute_screenshot(resume_id).await
                });

        accepted(&process_id, "screenshot generation accepted for processing")
    }

    async fn export_inner(&self, request: ExportResumeRequest) -> AsyncTaskResponse {
        if request.theme.trim().is_empty() {
            return failure(ErrorKind::ValidationFailed, "theme is required");
        }

        let resume = match parse_resume(&request.resume_json) {
            Ok(resume) => resume,
            Err(response) => return *response,
        };

        let task_request = TaskRequest::Export {
            resume_id: resume.id.clone(),
            theme: request.theme.clone(),
        };

        let executor_state = self.state.clone();
        let theme = request.theme;
        let process_id =
            self.state
                .tasks()
                .submit(TaskKind::Export, task_request, async move {
                    executor_state.execute_export(resume, theme).await
                });

        accepted(&process_id, "resume export accepted for processing")
    }
}

/// Parses a JSON resume payload, requiring a non-empty id.
fn parse_resume(raw: &str) -> Result<Resume, Box<AsyncTaskResponse>> {
    let resume: Resume = serde_json::from_str(raw).map_err(|error| {
        Box::new(failure(
            ErrorKind::ValidationFailed,
            format!("resume payload is not valid: {error}"),
        ))
    })?;

    if resume.id.trim().is_empty() {
        return Err(Box::new(failure(
            ErrorKind::ValidationFailed,
            "resume.id is required",
        )));
    }

    Ok(resume)
}

#[tonic::async_trait]
impl ResumeService for ResumeRpc {
    async fn tailor_resume(
        &self,
        request: Request<TailorResumeRequest>,
    ) -> Result<Response<AsyncTaskResponse>, Status> {
        let request = request.into_inner();
        let response = with_panic_barrier(self.tailor_inner(request)).await;
        Ok(Response::new(response))
    }

    async fn generate_screenshot(
        &self,
        request: Request<GenerateScreenshotRequest>,
    ) -> Result<Response<AsyncTaskResponse>, Status> {
        let request = request.into_inner();
        let response = with_panic_barrier(self.screenshot_inner(request)).await;
        Ok(Response::new(response))
    }

    async fn export_resume(
        &self,
        request: Request<ExportResumeRequest>,
    ) -> Result<Response<AsyncTaskResponse>, Status> {
        let request = request.into_inner();
        let response = with_panic_barrier(self.export_inner(request)).await;
        Ok(Response::new(response))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use vitae_ai::{CompletionBackend, ThreadMessage};
    use vitae_core::Result;
    use vitae_proto::v1::JobDetails;

    use super::*;
    use crate::service::ServiceConfig;

    /// Backend stub echoing back a minimal resume.
    struct EchoBackend;

    #[async_trait]
    impl CompletionBackend for EchoBackend {
        async fn complete(&self, _prompt: &str, _history: &[ThreadMessage]) -> Result<String> {
            Ok(r#"{"id": "res_1", "sections": []}"#.to_string())
        }
    }

    fn rpc_with_tailor() -> (ResumeRpc, ServiceState) {
        let state = ServiceState::builder(ServiceConfig::default())
            .with_tailor_backend(Arc::new(EchoBackend))
            .build()
            .expect("service state");
        (ResumeRpc::new(state.clone()), state)
    }

    fn rpc_bare() -> (ResumeRpc, ServiceState) {
        let state = ServiceState::builder(ServiceConfig::default())
            .build()
            .expect("service state");
        (ResumeRpc::new(state.clone()), state)
    }

    fn tailor_request() -> TailorResumeRequest {
        TailorResumeRequest {
            base_resume_json: r#"{"id": "res_1", "sections": []}"#.into(),
            job: Some(JobDetails {
                title: "Engineer".into(),
                company_name: "Acme".into(),
                description: "Build things.".into(),
                location: String::new(),
            }),
            resume_id: "res_1".into(),
        }
    }

    #[tokio::test]
    async fn tailor_accepts_with_a_tailor_process_id() {
        let (rpc, state) = rpc_with_tailor();

        let response = rpc.tailor_inner(tailor_request()).await;
        assert_eq!(response.status, "ACCEPTED");
        assert!(response.process_id.starts_with("tailor_"));

        state.shutdown().await;
    }

    #[tokio::test]
    async fn tailor_without_provider_fails_with_configuration_error() {
        let (rpc, state) = rpc_bare();

        let response = rpc.tailor_inner(tailor_request()).await;
        assert_eq!(response.status, "FAILURE");
        assert_eq!(response.error, "configuration_error");

        state.shutdown().await;
    }

    #[tokio::test]
    async fn tailor_requires_job_fields() {
        let (rpc, state) = rpc_with_tailor();

        let mut request = tailor_request();
        request.job = Some(JobDetails {
            title: String::new(),
            company_name: "Acme".into(),
            description: String::new(),
            location: String::new(),
        });

        let response = rpc.tailor_inner(request).await;
        assert_eq!(response.status, "FAILURE");
        assert_eq!(response.error, "validation_failed");

        state.shutdown().await;
    }

    #[tokio::test]
    async fn export_rejects_resumes_without_an_id() {
        let (rpc, state) = rpc_bare();

        let response = rpc
            .export_inner(ExportResumeRequest {
                resume_json: r#"{"id": "", "sections": []}"#.into(),
                theme: "classic".into(),
            })
            .await;

        assert_eq!(response.status, "FAILURE");
        assert_eq!(response.error, "validation_failed");

        state.shutdown().await;
    }

    #[tokio::test]
    async fn export_requires_a_theme() {
        let (rpc, state) = rpc_bare();

        let response = rpc
            .export_inner(ExportResumeRequest {
                resume_json: r#"{"id": "res_1", "sections": []}"#.into(),
                theme: "  ".into(),
            })
            .await;

        assert_eq!(response.status, "FAILURE");
        assert_eq!(response.error, "validation_failed");

        state.shutdown().await;
    }

    #[tokio::test]
    async fn screenshot_without_renderer_fails_with_configuration_error() {
        let (rpc, state) = rpc_bare();

        let response = rpc
            .screenshot_inner(GenerateScreenshotRequest {
                resume_id: "res_1".into(),
            })
            .await;

        assert_eq!(response.status, "FAILURE");
        assert_eq!(response.error, "configuration_error");

        state.shutdown().await;
    }
}
