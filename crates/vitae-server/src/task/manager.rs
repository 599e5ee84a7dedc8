//! Task manager: process-id issuing, background execution, status queries.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::FutureExt;
use jiff::Timestamp;
use tokio_util::sync::CancellationToken;
use vitae_core::task::{TaskError, TaskRecord, TaskRequest, TaskResult};
use vitae_core::{Error, ErrorKind, ProcessId, TaskKind};

use super::TRACING_TARGET;

/// Owns the process-id -> record map and drives one background task per
/// submission.
///
/// Cheap to clone; all clones share the table. Background tasks run on
/// detached tokio tasks guarded by the manager-wide shutdown token, never by
/// any request context: a client disconnecting after `submit` has no effect
/// on the task's outcome.
#[derive(Clone)]
pub struct TaskManager {
    inner: Arc<Inner>,
}

struct Inner {
    records: RwLock<HashMap<ProcessId, TaskRecord>>,
    shutdown: CancellationToken,
    terminal_ttl: Duration,
}

impl TaskManager {
    /// Creates a manager whose terminal records expire after `terminal_ttl`.
    pub fn new(terminal_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                records: RwLock::new(HashMap::new()),
                shutdown: CancellationToken::new(),
                terminal_ttl,
            }),
        }
    }

    /// Token cancelled when the manager shuts down.
    ///
    /// Executors derive their cancellation from this, keeping task outcomes
    /// independent of connection liveness.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    /// Requests shutdown of all in-flight executors.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    /// Creates an `Accepted` record, launches the executor in the
    /// background and returns the process id without waiting.
    pub fn submit<F>(&self, kind: TaskKind, request: TaskRequest, executor: F) -> ProcessId
    where
        F: Future<Output = Result<TaskResult, Error>> + Send + 'static,
    {
        let record = TaskRecord::accepted(kind, request);
        let process_id = record.process_id.clone();

        {
            let mut records = self.inner.records.write().expect("task table lock poisoned");
            records.insert(process_id.clone(), record);
        }

        tracing::info!(
            target: TRACING_TARGET,
            process_id = %process_id,
            kind = %kind,
            "task accepted"
        );

        let manager = self.clone();
        let id = process_id.clone();
        tokio::spawn(async move {
            manager.drive(id, executor).await;
        });

        process_id
    }

    /// Runs one executor to completion and records the terminal state.
    async fn drive<F>(&self, process_id: ProcessId, executor: F)
    where
        F: Future<Output = Result<TaskResult, Error>> + Send + 'static,
    {
        if !self.mark_processing(&process_id) {
            // The record vanished or was already terminal; nothing to drive.
            return;
        }

        let outcome = AssertUnwindSafe(executor).catch_unwind().await;

        match outcome {
            Ok(Ok(result)) => self.complete(&process_id, result),
            Ok(Err(error)) => self.fail(&process_id, TaskError::from(&error)),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<String>()
                    .map(String::as_str)
                    .or_else(|| panic.downcast_ref::<&str>().copied())
                    .unwrap_or("unknown panic type");

                tracing::error!(
                    target: TRACING_TARGET,
                    process_id = %process_id,
                    message,
                    "executor panicked"
                );

                self.fail(
                    &process_id,
                    TaskError {
                        code: ErrorKind::Internal,
                        message: format!("executor panicked: {message}"),
                    },
                );
            }
        }
    }

    /// Returns a consistent snapshot of one record.
    pub fn status(&self, process_id: &ProcessId) -> Option<TaskRecord> {
        self.inner
            .records
            .read()
            .expect("task table lock poisoned")
            .get(process_id)
            .cloned()
    }

    /// Returns a snapshot of every record, for diagnostics.
    pub fn list(&self) -> Vec<TaskRecord> {
        self.inner
            .records
            .read()
            .expect("task table lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Number of tracked records.
    pub fn len(&self) -> usize {
        self.inner.records.read().expect("task table lock poisoned").len()
    }

    /// True when no records are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mark_processing(&self, process_id: &ProcessId) -> bool {
        let mut records = self.inner.records.write().expect("task table lock poisoned");
        records
            .get_mut(process_id)
            .map(TaskRecord::start)
            .unwrap_or(false)
    }

    fn complete(&self, process_id: &ProcessId, result: TaskResult) {
        let mut records = self.inner.records.write().expect("task table lock poisoned");
        if let Some(record) = records.get_mut(process_id) {
            if record.succeed(result) {
                tracing::info!(
                    target: TRACING_TARGET,
                    process_id = %process_id,
                    processing_time_ms = record.processing_time_ms,
                    "task succeeded"
                );
            }
        }
    }

    fn fail(&self, process_id: &ProcessId, error: TaskError) {
        let mut records = self.inner.records.write().expect("task table lock poisoned");
        if let Some(record) = records.get_mut(process_id) {
            let code = error.code;
            if record.fail(error) {
                tracing::warn!(
                    target: TRACING_TARGET,
                    process_id = %process_id,
                    code = code.code(),
                    "task failed"
                );
            }
        }
    }

    /// Spawns the terminal-record TTL sweeper.
    ///
    /// Only terminal records are evicted, so the lifecycle invariants are
    /// untouched; a missing id simply reads as `NotFound` afterwards.
    pub fn spawn_sweeper(&self, sweep_interval: Duration) {
        let manager = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let cancel = manager.inner.shutdown.clone();

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let cutoff = Timestamp::now() - manager.inner.terminal_ttl;
                let mut records =
                    manager.inner.records.write().expect("task table lock poisoned");
                let before = records.len();

                records.retain(|_, record| {
                    !record.is_terminal()
                        || record.completed_at.is_none_or(|at| at > cutoff)
                });

                let removed = before - records.len();
                if removed > 0 {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        removed,
                        remaining = records.len(),
                        "expired terminal task records"
                    );
                }
            }
        });
    }
}
