//! Task records and their lifecycle state machine.
//!
//! A task record is created in [`TaskStatus::Accepted`] the moment a
//! submission is validated, then driven by exactly one background task:
//! `Accepted -> Processing -> {Success, Failure}`. Reverse transitions are
//! forbidden and terminal records are immutable; the transition methods on
//! [`TaskRecord`] enforce both.

use std::collections::HashMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, ErrorKind};
use crate::model::{JobPosting, Resume};

/// Tracing target for task lifecycle transitions.
const TRACING_TARGET: &str = "vitae_core::task";

/// The category of work a task performs.
///
/// The lowercase form is the process-id prefix clients use to demux task
/// types, so it is part of the wire contract.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "lowercase")]
pub enum TaskKind {
    /// Extract a job posting from a URL or a raw description.
    Scrape,
    /// Produce an AI-tailored resume for a job posting.
    Tailor,
    /// Render a resume screenshot.
    Screenshot,
    /// Export a resume as LaTeX/PDF.
    Export,
}

/// Client-visible identifier of an asynchronously-executing task.
///
/// Format: `<kind>_<yyyymmdd>_<uuid-v4>`, e.g.
/// `scrape_20250101_67e55044-10b1-426f-9247-bb680e5fe0c8`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(transparent)]
pub struct ProcessId(String);

impl ProcessId {
    /// Generates a fresh process id for the given kind.
    ///
    /// Uniqueness comes from the embedded UUIDv4; ids are never reused for
    /// the lifetime of the process.
    pub fn generate(kind: TaskKind) -> Self {
        let date = Timestamp::now().strftime("%Y%m%d");
        Self(format!("{kind}_{date}_{}", Uuid::new_v4()))
    }

    /// Returns the string form of this id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recovers the task kind from the id prefix, if it carries one.
    pub fn kind(&self) -> Option<TaskKind> {
        let prefix = self.0.split('_').next()?;
        prefix.parse().ok()
    }
}

impl From<String> for ProcessId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProcessId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle state of a task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Stored, background task not yet started.
    Accepted,
    /// Background task is executing.
    Processing,
    /// Terminal: executor returned a result.
    Success,
    /// Terminal: executor returned an error or panicked.
    Failure,
}

impl TaskStatus {
    /// Returns true if this status is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

/// Structured error stored on a failed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct TaskError {
    /// Stable error code from the workspace taxonomy.
    pub code: ErrorKind,
    /// Free-form description of the failure.
    pub message: String,
}

impl From<&Error> for TaskError {
    fn from(error: &Error) -> Self {
        Self {
            code: error.kind,
            message: error.to_string(),
        }
    }
}

impl From<Error> for TaskError {
    fn from(error: Error) -> Self {
        Self::from(&error)
    }
}

/// The validated request payload a task was created from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskRequest {
    Scrape {
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Tailor {
        resume_id: String,
        job_title: String,
        company_name: String,
    },
    Screenshot {
        resume_id: String,
    },
    Export {
        resume_id: String,
        theme: String,
    },
}

/// The completion payload of a successful task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskResult {
    Scrape {
        posting: JobPosting,
        engine: String,
    },
    Tailor {
        resume: Resume,
        thread_id: String,
    },
    Screenshot {
        url: String,
        key: String,
    },
    Export {
        url: String,
        key: String,
        format: String,
    },
}

/// A single entry in the task table.
///
/// Snapshots of this struct are what `status` and `list` return; all fields
/// serialize into the task JSON visible on both surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Client-visible identifier.
    pub process_id: ProcessId,
    /// Category of work.
    pub kind: TaskKind,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// The validated submission payload.
    pub request: TaskRequest,
    /// Completion payload, present iff `status == Success`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    /// Structured error, present iff `status == Failure`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the background task began executing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// When the task reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Wall-clock execution time in milliseconds, derived on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    /// Free-form diagnostics.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl TaskRecord {
    /// Creates a record in the `Accepted` state with a fresh process id.
    pub fn accepted(kind: TaskKind, request: TaskRequest) -> Self {
        Self {
            process_id: ProcessId::generate(kind),
            kind,
            status: TaskStatus::Accepted,
            request,
            result: None,
            error: None,
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
            processing_time_ms: None,
            metadata: HashMap::new(),
        }
    }

    /// Transitions `Accepted -> Processing` and stamps `started_at`.
    ///
    /// Returns false (and leaves the record untouched) if the record is not
    /// in `Accepted`.
    pub fn start(&mut self) -> bool {
        if self.status != TaskStatus::Accepted {
            tracing::warn!(
                target: TRACING_TARGET,
                process_id = %self.process_id,
                status = %self.status,
                "refusing non-monotonic transition to Processing"
            );
            return false;
        }

        self.status = TaskStatus::Processing;
        self.started_at = Some(Timestamp::now());
        true
    }

    /// Transitions to `Success` and stores the result.
    pub fn succeed(&mut self, result: TaskResult) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.status = TaskStatus::Success;
        self.result = Some(result);
        self.close();
        true
    }

    /// Transitions to `Failure` and stores the structured error.
    pub fn fail(&mut self, error: TaskError) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.status = TaskStatus::Failure;
        self.error = Some(error);
        self.close();
        true
    }

    /// Stamps terminal timing fields.
    fn close(&mut self) {
        let completed = Timestamp::now();
        self.completed_at = Some(completed);
        if let Some(started) = self.started_at {
            let elapsed = completed.duration_since(started);
            self.processing_time_ms = Some(elapsed.as_millis().max(0) as u64);
        }
    }

    /// Returns true if the record reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
