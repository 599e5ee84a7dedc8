//! A single long-lived execution context pulling jobs from its own inbox.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vitae_core::ErrorKind;

use crate::TRACING_TARGET;
use crate::job::{Job, JobResult};
use crate::limit::{Decision, RateLimiter};
use crate::scraper::Scraper;
use crate::stats::PoolStats;

/// One worker: inbox consumer that drives the scraper and reports admission
/// outcomes back to the rate limiter.
pub(crate) struct Worker {
    id: usize,
    inbox: mpsc::Receiver<Job>,
    scraper: Arc<dyn Scraper>,
    limiter: RateLimiter,
    stats: Arc<PoolStats>,
    cancel: CancellationToken,
    default_timeout: Duration,
    alive: Arc<AtomicBool>,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: usize,
        inbox: mpsc::Receiver<Job>,
        scraper: Arc<dyn Scraper>,
        limiter: RateLimiter,
        stats: Arc<PoolStats>,
        cancel: CancellationToken,
        default_timeout: Duration,
        alive: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            inbox,
            scraper,
            limiter,
            stats,
            cancel,
            default_timeout,
            alive,
        }
    }

    /// Spawns the worker as a background task.
    ///
    /// The loop itself runs behind a panic barrier; whatever the exit path,
    /// the alive flag drops so the dispatcher stops feeding this inbox.
    pub(crate) fn spawn(self) -> JoinHandle<()> {
        let worker_id = self.id;
        let alive = Arc::clone(&self.alive);

        tokio::spawn(async move {
            if let Err(panic) = AssertUnwindSafe(self.run()).catch_unwind().await {
                let message = panic_message(&panic);
                tracing::error!(
                    target: TRACING_TARGET,
                    worker_id,
                    message,
                    "worker loop panicked"
                );
            }
            alive.store(false, Ordering::Release);
        })
    }

    async fn run(mut self) {
        tracing::debug!(target: TRACING_TARGET, worker_id = self.id, "worker started");

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        worker_id = self.id,
                        "shutdown requested, stopping worker"
                    );
                    break;
                }

                job = self.inbox.recv() => {
                    let Some(job) = job else { break };
                    self.process(job).await;
                }
            }
        }
    }

    async fn process(&self, job: Job) {
        let destination = job.payload.destination();

        match self.limiter.allow(&destination) {
            Decision::Allowed => {}
            Decision::DeniedRate => {
                self.stats.record_outcome(false, Duration::ZERO);
                job.finish(Err(ErrorKind::RateLimited
                    .with_message(format!("rate limit exceeded for {destination}"))));
                return;
            }
            Decision::DeniedCircuit => {
                self.stats.record_outcome(false, Duration::ZERO);
                job.finish(Err(ErrorKind::CircuitOpen
                    .with_message(format!("circuit open for {destination}"))));
                return;
            }
        }

        let deadline = job.options.timeout_or(self.default_timeout);
        let started = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            worker_id = self.id,
            job_id = %job.id,
            destination = %destination,
            timeout_secs = deadline.as_secs(),
            "processing job"
        );

        let extraction = AssertUnwindSafe(self.scraper.extract(
            &job.payload,
            &job.options,
            &job.cancel,
        ))
        .catch_unwind();

        let outcome = match tokio::time::timeout(deadline, extraction).await {
            Ok(Ok(Ok(extraction))) => Ok(extraction),
            Ok(Ok(Err(error))) => Err(error),
            Ok(Err(panic)) => Err(ErrorKind::Internal
                .with_message(format!("scraper panicked: {}", panic_message(&panic)))),
            Err(_elapsed) => Err(ErrorKind::Timeout
                .with_message(format!("extraction exceeded {}s", deadline.as_secs()))),
        };

        let duration = started.elapsed();

        // Both outcomes feed the breaker so its failure window stays
        // accurate across recoveries.
        match &outcome {
            Ok(_) => self.limiter.record_success(&destination),
            Err(_) => self.limiter.record_failure(&destination),
        }
        self.stats.record_outcome(outcome.is_ok(), duration);

        match outcome {
            Ok(extraction) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    worker_id = self.id,
                    job_id = %job.id,
                    engine = %extraction.engine,
                    duration_ms = duration.as_millis() as u64,
                    "job completed"
                );
                let result = JobResult {
                    job_id: job.id.clone(),
                    posting: extraction.posting,
                    engine: extraction.engine,
                    duration,
                };
                job.finish(Ok(result));
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    worker_id = self.id,
                    job_id = %job.id,
                    destination = %destination,
                    error = %error,
                    "job failed"
                );
                job.finish(Err(error));
            }
        }
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic type")
}

/// Handle the dispatcher uses to feed and monitor one worker.
#[derive(Clone)]
pub(crate) struct WorkerHandle {
    pub inbox: mpsc::Sender<Job>,
    pub alive: Arc<AtomicBool>,
}

impl WorkerHandle {
    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}
