//! Append-only conversation history keyed by resume id.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::TRACING_TARGET;

/// How long an untouched thread survives.
const THREAD_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Sweeper period for expired threads.
const SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadRole {
    User,
    Assistant,
}

/// One entry in a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub role: ThreadRole,
    pub content: String,
    pub at: Timestamp,
}

struct Thread {
    id: String,
    messages: Vec<ThreadMessage>,
    last_touched: Instant,
}

/// In-memory, TTL-bounded conversation store.
///
/// Thread creation is idempotent per resume id; history is append-only.
/// Cheap to clone, all clones share the same table.
#[derive(Clone)]
pub struct ConversationStore {
    threads: Arc<RwLock<HashMap<String, Thread>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            threads: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the thread id for a resume, creating the thread on first use.
    ///
    /// Calling this twice for the same resume id returns the same thread;
    /// no duplicate is created.
    pub fn ensure_thread(&self, resume_id: &str) -> String {
        let mut threads = self.threads.write().expect("thread table lock poisoned");

        let thread = threads
            .entry(resume_id.to_string())
            .or_insert_with(|| Thread {
                id: format!("thread-{}", Uuid::new_v4()),
                messages: Vec::new(),
                last_touched: Instant::now(),
            });
        thread.last_touched = Instant::now();
        thread.id.clone()
    }

    /// Appends a message to a resume's thread, creating it if needed.
    pub fn append(&self, resume_id: &str, role: ThreadRole, content: impl Into<String>) {
        let mut threads = self.threads.write().expect("thread table lock poisoned");

        let thread = threads
            .entry(resume_id.to_string())
            .or_insert_with(|| Thread {
                id: format!("thread-{}", Uuid::new_v4()),
                messages: Vec::new(),
                last_touched: Instant::now(),
            });

        thread.messages.push(ThreadMessage {
            role,
            content: content.into(),
            at: Timestamp::now(),
        });
        thread.last_touched = Instant::now();
    }

    /// Returns a snapshot of a resume's history, oldest first.
    pub fn history(&self, resume_id: &str) -> Vec<ThreadMessage> {
        self.threads
            .read()
            .expect("thread table lock poisoned")
            .get(resume_id)
            .map(|thread| thread.messages.clone())
            .unwrap_or_default()
    }

    /// Number of live threads.
    pub fn len(&self) -> usize {
        self.threads.read().expect("thread table lock poisoned").len()
    }

    /// True when no threads are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawns the TTL sweeper, stopping when `cancel` fires.
    pub fn spawn_sweeper(&self, cancel: CancellationToken) {
        let threads = Arc::clone(&self.threads);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let now = Instant::now();
                let mut threads = threads.write().expect("thread table lock poisoned");
                let before = threads.len();
                threads.retain(|_, thread| now.duration_since(thread.last_touched) < THREAD_TTL);

                let removed = before - threads.len();
                if removed > 0 {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        removed,
                        remaining = threads.len(),
                        "expired conversation threads"
                    );
                }
            }
        });
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
