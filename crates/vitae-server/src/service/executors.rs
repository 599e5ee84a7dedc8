//! Kind-specific executor bodies driven by the task manager.
//!
//! Each executor derives its cancellation from the manager-wide shutdown
//! token, never from the submitting request: a client disconnect after
//! submission has no effect on the running work.

use std::time::Duration;

use bytes::Bytes;
use uuid::Uuid;
use vitae_core::model::{JobPosting, Resume};
use vitae_core::retry::retry_with_backoff;
use vitae_core::task::TaskResult;
use vitae_core::{Error, ErrorKind, Result};
use vitae_pool::{JobOptions, JobPayload};

use super::export::render_document;
use super::state::ServiceState;

/// Attempts for artifact uploads before the task fails.
const UPLOAD_RETRIES: u32 = 3;

/// Initial backoff between upload attempts.
const UPLOAD_BACKOFF: Duration = Duration::from_millis(250);

impl ServiceState {
    /// Runs a scrape through the worker pool.
    pub(crate) async fn execute_scrape(
        &self,
        payload: JobPayload,
        options: JobOptions,
    ) -> Result<TaskResult, Error> {
        let ctx = self.tasks().shutdown_token();
        let result = self.pool().submit_job(&ctx, payload, options).await?;

        Ok(TaskResult::Scrape {
            posting: result.posting,
            engine: result.engine,
        })
    }

    /// Runs AI tailoring against the configured provider.
    pub(crate) async fn execute_tailor(
        &self,
        resume: Resume,
        posting: JobPosting,
        resume_id: String,
    ) -> Result<TaskResult, Error> {
        let tailor = self.tailor().ok_or_else(|| {
            ErrorKind::ConfigurationError.with_message("no tailoring provider configured")
        })?;

        let outcome = tailor.tailor(&resume, &posting, &resume_id).await?;

        Ok(TaskResult::Tailor {
            resume: outcome.resume,
            thread_id: outcome.thread_id,
        })
    }

    /// Renders a screenshot and replaces the resume's stored renders.
    pub(crate) async fn execute_screenshot(&self, resume_id: String) -> Result<TaskResult, Error> {
        let renderer = self.renderer().cloned().ok_or_else(|| {
            ErrorKind::ConfigurationError.with_message("no screenshot renderer configured")
        })?;

        let image = renderer.render(&resume_id).await?;

        let prefix = format!("screenshots/{resume_id}/");
        let key = format!("{prefix}{}.png", Uuid::new_v4());

        let store = self.store().clone();
        let url = retry_with_backoff(UPLOAD_RETRIES, UPLOAD_BACKOFF, || {
            let store = store.clone();
            let prefix = prefix.clone();
            let key = key.clone();
            let image = image.clone();
            async move {
                store
                    .replace_prefix(&prefix, &key, image, "image/png")
                    .await
            }
        })
        .await?;

        Ok(TaskResult::Screenshot { url, key })
    }

    /// Renders the LaTeX export and uploads it.
    pub(crate) async fn execute_export(
        &self,
        resume: Resume,
        theme: String,
    ) -> Result<TaskResult, Error> {
        let document = render_document(&resume, &theme)?;
        let key = format!("exports/{}/{}.tex", resume.id, Uuid::new_v4());

        let store = self.store().clone();
        let bytes = Bytes::from(document);
        let url = retry_with_backoff(UPLOAD_RETRIES, UPLOAD_BACKOFF, || {
            let store = store.clone();
            let key = key.clone();
            let bytes = bytes.clone();
            async move { store.upload(&key, bytes, "application/x-tex").await }
        })
        .await?;

        Ok(TaskResult::Export {
            url,
            key,
            format: "latex".to_string(),
        })
    }
}
