//! Job model flowing through the pool's channels.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vitae_core::model::JobPosting;
use vitae_core::{Error, Result};

/// What a job extracts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPayload {
    /// Fetch and extract a posting from a URL.
    Url(String),
    /// Extract a posting from pasted description text.
    Description(String),
}

impl JobPayload {
    /// Returns the rate-limiting destination for this payload.
    ///
    /// URLs map to their lowercased hostname; descriptions and unparseable
    /// URLs share the `"unknown"` destination.
    pub fn destination(&self) -> String {
        match self {
            Self::Url(raw) => url::Url::parse(raw)
                .ok()
                .and_then(|url| url.host_str().map(str::to_lowercase))
                .unwrap_or_else(|| "unknown".to_string()),
            Self::Description(_) => "unknown".to_string(),
        }
    }
}

/// Per-job tuning options supplied by the caller.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Extraction deadline in seconds; the pool default applies when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Preferred extraction engine, advisory only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

impl JobOptions {
    /// Resolves the effective deadline given the pool default.
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout_secs.map_or(default, Duration::from_secs)
    }
}

/// What a scraper produced for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// The extracted posting.
    pub posting: JobPosting,
    /// Name of the engine that produced it.
    pub engine: String,
}

/// Terminal outcome of a successfully executed job.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Pool-internal job id, independent of process ids.
    pub job_id: String,
    /// The extracted posting.
    pub posting: JobPosting,
    /// Engine that produced the extraction.
    pub engine: String,
    /// Wall-clock execution time inside the worker.
    pub duration: Duration,
}

/// A unit of work queued for the dispatcher.
///
/// `sink` is single-shot: exactly one send happens on it (the terminal
/// outcome), after which the channel is closed by drop.
pub(crate) struct Job {
    pub id: String,
    pub payload: JobPayload,
    pub options: JobOptions,
    /// Cancellation scope for this job, chained from the submitter.
    pub cancel: CancellationToken,
    pub sink: oneshot::Sender<Result<JobResult, Error>>,
}

impl Job {
    pub(crate) fn new(
        payload: JobPayload,
        options: JobOptions,
        cancel: CancellationToken,
        sink: oneshot::Sender<Result<JobResult, Error>>,
    ) -> Self {
        Self {
            id: format!("job-{}", Uuid::new_v4()),
            payload,
            options,
            cancel,
            sink,
        }
    }

    /// Delivers the terminal outcome, consuming the job.
    ///
    /// A dropped receiver means the submitter stopped waiting; the outcome
    /// is discarded silently in that case.
    pub(crate) fn finish(self, outcome: Result<JobResult, Error>) {
        let _ = self.sink.send(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_is_lowercased_hostname() {
        let payload = JobPayload::Url("https://Jobs.Example.COM/listing/42".into());
        assert_eq!(payload.destination(), "jobs.example.com");
    }

    #[test]
    fn unparseable_urls_share_the_unknown_destination() {
        assert_eq!(JobPayload::Url("not a url".into()).destination(), "unknown");
        assert_eq!(
            JobPayload::Description("Senior Rust Engineer...".into()).destination(),
            "unknown"
        );
    }

    #[test]
    fn timeout_falls_back_to_pool_default() {
        let options = JobOptions::default();
        assert_eq!(options.timeout_or(Duration::from_secs(30)), Duration::from_secs(30));

        let options = JobOptions {
            timeout_secs: Some(5),
            ..Default::default()
        };
        assert_eq!(options.timeout_or(Duration::from_secs(30)), Duration::from_secs(5));
    }
}
