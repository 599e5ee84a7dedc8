//! The worker pool facade.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vitae_core::{Error, ErrorKind, Result};

use crate::TRACING_TARGET;
use crate::dispatcher::Dispatcher;
use crate::job::{Job, JobOptions, JobPayload, JobResult};
use crate::limit::{RateLimitConfig, RateLimiter};
use crate::scraper::Scraper;
use crate::stats::{PoolStats, PoolStatsSnapshot};
use crate::worker::{Worker, WorkerHandle};

/// Worker pool sizing and timing knobs.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of long-lived workers.
    pub workers: usize,
    /// Capacity of the shared job queue; saturation fails submissions fast.
    pub queue_size: usize,
    /// Capacity of each worker's inbox.
    pub inbox_capacity: usize,
    /// Extraction deadline applied when a job carries none.
    pub default_timeout: Duration,
    /// Per-destination admission configuration.
    pub rate_limit: RateLimitConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_size: 100,
            inbox_capacity: 1,
            default_timeout: Duration::from_secs(30),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Bounded, fair, per-destination-aware execution of extraction jobs.
///
/// Owns the workers, the dispatcher, the rate limiter and the shared job
/// queue. Cheap to share behind an `Arc`.
pub struct WorkerPool {
    queue: mpsc::Sender<Job>,
    limiter: RateLimiter,
    stats: Arc<PoolStats>,
    cancel: CancellationToken,
    dispatcher_alive: Arc<AtomicBool>,
    worker_alive: Vec<Arc<AtomicBool>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Starts workers, dispatcher and the limiter sweeper.
    pub fn start(config: PoolConfig, scraper: Arc<dyn Scraper>) -> Arc<Self> {
        let workers = config.workers.max(1);
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_size.max(1));
        let limiter = RateLimiter::new(config.rate_limit);
        let stats = Arc::new(PoolStats::default());
        let cancel = CancellationToken::new();

        let mut handles = Vec::with_capacity(workers + 1);
        let mut worker_handles = Vec::with_capacity(workers);
        let mut worker_alive = Vec::with_capacity(workers);

        for id in 0..workers {
            let (inbox_tx, inbox_rx) = mpsc::channel(config.inbox_capacity.max(1));
            let alive = Arc::new(AtomicBool::new(true));

            let worker = Worker::new(
                id,
                inbox_rx,
                Arc::clone(&scraper),
                limiter.clone(),
                Arc::clone(&stats),
                cancel.clone(),
                config.default_timeout,
                Arc::clone(&alive),
            );
            handles.push(worker.spawn());

            worker_handles.push(WorkerHandle {
                inbox: inbox_tx,
                alive: Arc::clone(&alive),
            });
            worker_alive.push(alive);
        }

        let dispatcher_alive = Arc::new(AtomicBool::new(true));
        let dispatcher = Dispatcher::new(
            queue_rx,
            worker_handles,
            cancel.clone(),
            Arc::clone(&dispatcher_alive),
        );
        handles.push(dispatcher.spawn());

        limiter.spawn_sweeper(cancel.child_token());

        tracing::info!(
            target: TRACING_TARGET,
            workers,
            queue_size = config.queue_size,
            default_timeout_secs = config.default_timeout.as_secs(),
            "worker pool started"
        );

        Arc::new(Self {
            queue: queue_tx,
            limiter,
            stats,
            cancel,
            dispatcher_alive,
            worker_alive,
            handles: Mutex::new(handles),
        })
    }

    /// Enqueues a job and awaits its single-shot result.
    ///
    /// Fails fast with `queue_full` when the shared queue is saturated.
    /// Cancelling `ctx` while waiting reports cancellation to the caller;
    /// an already-executing job is not interrupted directly but observes
    /// the chained job token.
    pub async fn submit_job(
        &self,
        ctx: &CancellationToken,
        payload: JobPayload,
        options: JobOptions,
    ) -> Result<JobResult> {
        let (sink_tx, sink_rx) = oneshot::channel();
        let job = Job::new(payload, options, ctx.child_token(), sink_tx);
        let job_id = job.id.clone();

        self.queue.try_send(job).map_err(|error| match error {
            TrySendError::Full(job) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    job_id = %job.id,
                    "job queue saturated"
                );
                Error::from(ErrorKind::QueueFull)
                    .with_message("worker pool queue is full, try again later")
            }
            TrySendError::Closed(_) => ErrorKind::ServiceUnavailable
                .with_message("worker pool is shut down"),
        })?;
        self.stats.record_queued();

        tokio::select! {
            outcome = sink_rx => match outcome {
                Ok(result) => result,
                // The sink was dropped without a send: the pool shut down
                // while the job was still queued.
                Err(_) => Err(ErrorKind::ServiceUnavailable
                    .with_message("pool shut down before the job completed")),
            },
            () = ctx.cancelled() => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    job_id = %job_id,
                    "submitter cancelled while awaiting result"
                );
                Err(ErrorKind::ServiceUnavailable
                    .with_message("submission cancelled while awaiting job result"))
            }
        }
    }

    /// Returns a snapshot of the aggregate counters.
    pub fn get_stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the shared rate limiter.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// True iff the dispatcher is running and at least one worker is alive.
    pub fn is_healthy(&self) -> bool {
        self.dispatcher_alive.load(Ordering::Acquire)
            && self
                .worker_alive
                .iter()
                .any(|alive| alive.load(Ordering::Acquire))
    }

    /// Number of currently live workers.
    pub fn live_workers(&self) -> usize {
        self.worker_alive
            .iter()
            .filter(|alive| alive.load(Ordering::Acquire))
            .count()
    }

    /// Cancels all pool tasks and waits for them to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.handles.lock().expect("pool handle lock poisoned");
            guard.drain(..).collect()
        };

        for handle in handles {
            if let Err(error) = handle.await {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "pool task join failed"
                );
            }
        }

        tracing::info!(target: TRACING_TARGET, "worker pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use async_trait::async_trait;
    use tokio::sync::{Notify, Semaphore};
    use vitae_core::model::JobPosting;

    use super::*;
    use crate::job::Extraction;

    /// Scraper stub with scriptable behavior per call.
    struct StubScraper {
        calls: AtomicU32,
        gate: Option<Arc<Semaphore>>,
        started: Option<Arc<Notify>>,
        fail: bool,
        panic: bool,
    }

    impl StubScraper {
        fn ok() -> Self {
            Self {
                calls: AtomicU32::new(0),
                gate: None,
                started: None,
                fail: false,
                panic: false,
            }
        }

        fn gated(gate: Arc<Semaphore>, started: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                started: Some(started),
                ..Self::ok()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::ok()
            }
        }

        fn panicking() -> Self {
            Self {
                panic: true,
                ..Self::ok()
            }
        }
    }

    #[async_trait]
    impl Scraper for StubScraper {
        async fn extract(
            &self,
            payload: &JobPayload,
            _options: &JobOptions,
            cancel: &CancellationToken,
        ) -> Result<Extraction> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(started) = &self.started {
                started.notify_one();
            }
            if let Some(gate) = &self.gate {
                tokio::select! {
                    permit = gate.acquire() => {
                        permit.expect("gate closed").forget();
                    }
                    () = cancel.cancelled() => {
                        return Err(ErrorKind::Timeout.with_message("cancelled"));
                    }
                }
            }

            if self.panic {
                panic!("scripted scraper panic");
            }
            if self.fail {
                return Err(ErrorKind::UpstreamFailure.with_message("scripted failure"));
            }

            let description = match payload {
                JobPayload::Url(url) => format!("posting at {url}"),
                JobPayload::Description(text) => text.clone(),
            };
            Ok(Extraction {
                posting: JobPosting {
                    title: Some("Engineer".into()),
                    description,
                    ..Default::default()
                },
                engine: "stub".into(),
            })
        }
    }

    fn quick_config() -> PoolConfig {
        PoolConfig {
            workers: 2,
            queue_size: 16,
            default_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn submit_job_delivers_exactly_one_result() -> anyhow::Result<()> {
        let pool = WorkerPool::start(quick_config(), Arc::new(StubScraper::ok()));
        let ctx = CancellationToken::new();

        let result = pool
            .submit_job(
                &ctx,
                JobPayload::Url("https://example.com/job/1".into()),
                JobOptions::default(),
            )
            .await?;

        assert_eq!(result.engine, "stub");
        assert!(result.job_id.starts_with("job-"));

        let stats = pool.get_stats();
        assert_eq!(stats.jobs_queued, 1);
        assert_eq!(stats.jobs_successful, 1);

        pool.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn saturated_queue_fails_fast_with_queue_full() {
        let gate = Arc::new(Semaphore::new(0));
        let started = Arc::new(Notify::new());
        let scraper = Arc::new(StubScraper::gated(gate.clone(), started.clone()));

        let pool = WorkerPool::start(
            PoolConfig {
                workers: 1,
                queue_size: 1,
                inbox_capacity: 1,
                ..quick_config()
            },
            scraper,
        );
        let ctx = CancellationToken::new();

        let mut pending = Vec::new();
        let mut saw_queue_full = false;

        // worker + inbox + dispatcher hand + queue bound the in-flight jobs;
        // one more submission must fail fast.
        for i in 0..6 {
            let pool = Arc::clone(&pool);
            let ctx = ctx.clone();
            let url = format!("https://example.com/job/{i}");

            if i == 0 {
                let handle = tokio::spawn(async move {
                    pool.submit_job(&ctx, JobPayload::Url(url), JobOptions::default())
                        .await
                });
                started.notified().await;
                pending.push(handle);
                continue;
            }

            // Give the dispatcher a moment to drain the queue slot.
            tokio::time::sleep(Duration::from_millis(20)).await;

            let submit = tokio::spawn(async move {
                pool.submit_job(&ctx, JobPayload::Url(url), JobOptions::default())
                    .await
            });
            tokio::time::sleep(Duration::from_millis(20)).await;

            if submit.is_finished() {
                let outcome = submit.await.expect("submit task");
                let error = outcome.expect_err("a fast completion here must be a rejection");
                assert_eq!(error.kind, ErrorKind::QueueFull);
                saw_queue_full = true;
                break;
            }
            pending.push(submit);
        }

        assert!(saw_queue_full, "no submission was rejected with queue_full");

        // Release the gate so every accepted job completes exactly once.
        gate.add_permits(pending.len());
        for handle in pending {
            let outcome = handle.await.expect("submit task");
            assert!(outcome.is_ok(), "accepted job failed: {outcome:?}");
        }

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn rate_limited_jobs_fail_with_rate_limited() {
        let pool = WorkerPool::start(
            PoolConfig {
                workers: 1,
                rate_limit: RateLimitConfig {
                    requests_per_minute: 60,
                    ..Default::default()
                },
                ..quick_config()
            },
            Arc::new(StubScraper::ok()),
        );
        let ctx = CancellationToken::new();

        let mut successes = 0;
        let mut rate_limited = 0;

        for _ in 0..9 {
            match pool
                .submit_job(
                    &ctx,
                    JobPayload::Url("https://one.example.com/job".into()),
                    JobOptions::default(),
                )
                .await
            {
                Ok(_) => successes += 1,
                Err(error) if error.kind == ErrorKind::RateLimited => rate_limited += 1,
                Err(error) => panic!("unexpected error: {error}"),
            }
        }

        // Burst of 5 plus at most one refilled token.
        assert!(successes >= 5 && successes <= 6, "successes = {successes}");
        assert!(rate_limited >= 3, "rate_limited = {rate_limited}");

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn upstream_failures_trip_the_circuit() {
        let pool = WorkerPool::start(
            PoolConfig {
                workers: 1,
                rate_limit: RateLimitConfig {
                    requests_per_minute: 60_000,
                    burst: 100,
                    ..Default::default()
                },
                ..quick_config()
            },
            Arc::new(StubScraper::failing()),
        );
        let ctx = CancellationToken::new();

        for _ in 0..5 {
            let error = pool
                .submit_job(
                    &ctx,
                    JobPayload::Url("https://flaky.example.com/job".into()),
                    JobOptions::default(),
                )
                .await
                .expect_err("scripted failure");
            assert_eq!(error.kind, ErrorKind::UpstreamFailure);
        }

        let error = pool
            .submit_job(
                &ctx,
                JobPayload::Url("https://flaky.example.com/job".into()),
                JobOptions::default(),
            )
            .await
            .expect_err("circuit must be open");
        assert_eq!(error.kind, ErrorKind::CircuitOpen);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn scraper_panic_is_contained_and_worker_survives() -> anyhow::Result<()> {
        let pool = WorkerPool::start(
            PoolConfig {
                workers: 1,
                rate_limit: RateLimitConfig {
                    requests_per_minute: 60_000,
                    burst: 100,
                    max_failures: 100,
                    ..Default::default()
                },
                ..quick_config()
            },
            Arc::new(StubScraper::panicking()),
        );
        let ctx = CancellationToken::new();

        let error = pool
            .submit_job(
                &ctx,
                JobPayload::Url("https://example.com/job".into()),
                JobOptions::default(),
            )
            .await
            .expect_err("panic becomes an error");
        assert_eq!(error.kind, ErrorKind::Internal);
        assert!(error.to_string().contains("scripted scraper panic"));

        assert!(pool.is_healthy());
        assert_eq!(pool.live_workers(), 1);

        pool.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn cancelling_the_submitter_reports_without_killing_the_pool() {
        let gate = Arc::new(Semaphore::new(0));
        let started = Arc::new(Notify::new());
        let pool = WorkerPool::start(
            PoolConfig {
                workers: 1,
                ..quick_config()
            },
            Arc::new(StubScraper::gated(gate.clone(), started.clone())),
        );
        let ctx = CancellationToken::new();

        let submit = {
            let pool = Arc::clone(&pool);
            let ctx = ctx.clone();
            tokio::spawn(async move {
                pool.submit_job(
                    &ctx,
                    JobPayload::Url("https://example.com/job".into()),
                    JobOptions::default(),
                )
                .await
            })
        };

        started.notified().await;
        ctx.cancel();

        let outcome = submit.await.expect("submit task");
        let error = outcome.expect_err("cancelled submission");
        assert_eq!(error.kind, ErrorKind::ServiceUnavailable);

        assert!(pool.is_healthy());
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn is_healthy_reports_false_after_shutdown() {
        let pool = WorkerPool::start(quick_config(), Arc::new(StubScraper::ok()));
        assert!(pool.is_healthy());
        pool.shutdown().await;
        assert!(!pool.is_healthy());
    }
}
