//! Round-robin assignment from the shared queue onto worker inboxes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vitae_core::ErrorKind;

use crate::TRACING_TARGET;
use crate::job::Job;
use crate::worker::{WorkerHandle, panic_message};

/// Pause after probing every inbox without a taker, so a saturated pool
/// does not burn a core busy-polling.
const FULL_SWEEP_BACKOFF: Duration = Duration::from_millis(1);

/// Single loop that drains the shared job queue and hands each job to
/// exactly one worker.
pub(crate) struct Dispatcher {
    queue: mpsc::Receiver<Job>,
    workers: Vec<WorkerHandle>,
    cursor: usize,
    cancel: CancellationToken,
    alive: Arc<AtomicBool>,
}

impl Dispatcher {
    pub(crate) fn new(
        queue: mpsc::Receiver<Job>,
        workers: Vec<WorkerHandle>,
        cancel: CancellationToken,
        alive: Arc<AtomicBool>,
    ) -> Self {
        Self {
            queue,
            workers,
            cursor: 0,
            cancel,
            alive,
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        let alive = Arc::clone(&self.alive);

        tokio::spawn(async move {
            if let Err(panic) = AssertUnwindSafe(self.run()).catch_unwind().await {
                tracing::error!(
                    target: TRACING_TARGET,
                    message = panic_message(&panic),
                    "dispatcher loop panicked"
                );
            }
            alive.store(false, Ordering::Release);
        })
    }

    async fn run(mut self) {
        tracing::debug!(
            target: TRACING_TARGET,
            workers = self.workers.len(),
            "dispatcher started"
        );

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    tracing::debug!(target: TRACING_TARGET, "shutdown requested, stopping dispatcher");
                    break;
                }

                job = self.queue.recv() => {
                    let Some(job) = job else { break };
                    self.assign(job).await;
                }
            }
        }
    }

    /// Probes workers in round-robin order with non-blocking sends until one
    /// accepts the job.
    ///
    /// The first successful send wins, so a job is never handed to two
    /// workers. Dead workers are skipped; if none are left the job fails
    /// rather than waiting forever.
    async fn assign(&mut self, mut job: Job) {
        loop {
            let mut alive_workers = 0;

            for _ in 0..self.workers.len() {
                let index = self.cursor;
                self.cursor = (self.cursor + 1) % self.workers.len();

                let worker = &self.workers[index];
                if !worker.is_alive() {
                    continue;
                }
                alive_workers += 1;

                match worker.inbox.try_send(job) {
                    Ok(()) => return,
                    Err(TrySendError::Full(returned) | TrySendError::Closed(returned)) => {
                        job = returned;
                    }
                }
            }

            if alive_workers == 0 {
                tracing::error!(
                    target: TRACING_TARGET,
                    job_id = %job.id,
                    "no live workers, dropping job"
                );
                job.finish(Err(ErrorKind::ServiceUnavailable
                    .with_message("no live workers available")));
                return;
            }

            if self.cancel.is_cancelled() {
                job.finish(Err(ErrorKind::ServiceUnavailable
                    .with_message("pool shut down before the job was assigned")));
                return;
            }

            // Every inbox was busy; yield before the next sweep.
            tokio::time::sleep(FULL_SWEEP_BACKOFF).await;
        }
    }
}
