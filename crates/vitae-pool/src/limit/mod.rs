//! Per-destination admission control.
//!
//! Combines a token bucket (steady-state rate with burst headroom) and a
//! circuit breaker (fail fast on persistently failing destinations) behind a
//! single synchronous [`RateLimiter::allow`] decision. Entries are created
//! lazily per destination and pruned by a background sweeper once idle.

mod breaker;
mod bucket;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

pub(crate) use breaker::CircuitState;
use breaker::CircuitBreaker;
use bucket::TokenBucket;
use tokio_util::sync::CancellationToken;

/// Tracing target for rate limiter operations.
const TRACING_TARGET: &str = "vitae_pool::limit";

/// Rate limiter configuration.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Steady-state admissions per destination per minute.
    pub requests_per_minute: u32,
    /// Short-term burst capacity on top of the steady rate.
    pub burst: u32,
    /// Consecutive failures that open a destination's circuit.
    pub max_failures: u32,
    /// How long an open circuit denies before probing.
    pub reset_timeout: Duration,
    /// Maximum in-flight probes while half-open.
    pub half_open_budget: u32,
    /// Idle age beyond which the sweeper evicts an entry.
    pub idle_eviction: Duration,
    /// Sweeper period.
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst: 5,
            max_failures: 5,
            reset_timeout: Duration::from_secs(30),
            half_open_budget: 3,
            idle_eviction: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

impl RateLimitConfig {
    /// Tokens per second the bucket refills at.
    fn refill_rate(&self) -> f64 {
        f64::from(self.requests_per_minute) / 60.0
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The call may proceed.
    Allowed,
    /// The token bucket is empty.
    DeniedRate,
    /// The destination's circuit is open or out of probe budget.
    DeniedCircuit,
}

impl Decision {
    /// Returns true if the call was admitted.
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }
}

/// Mutable per-destination state, serialized by its own lock.
struct DomainEntry {
    bucket: TokenBucket,
    breaker: CircuitBreaker,
    last_seen: Instant,
    requests: u64,
    failures: u64,
}

impl DomainEntry {
    fn new(config: &RateLimitConfig) -> Self {
        Self {
            bucket: TokenBucket::new(config.burst, config.refill_rate()),
            breaker: CircuitBreaker::new(
                config.max_failures,
                config.reset_timeout,
                config.half_open_budget,
            ),
            last_seen: Instant::now(),
            requests: 0,
            failures: 0,
        }
    }

    fn allow(&mut self, now: Instant) -> Decision {
        self.last_seen = now;

        if !self.breaker.try_acquire(now) {
            return Decision::DeniedCircuit;
        }

        if !self.bucket.try_consume(now) {
            // The circuit admitted the call but the bucket did not; give a
            // consumed half-open probe slot back.
            self.breaker.release_probe();
            return Decision::DeniedRate;
        }

        self.requests += 1;
        Decision::Allowed
    }

    /// True when the entry is safe to evict: idle past the threshold and not
    /// carrying open/half-open circuit state.
    fn evictable(&self, now: Instant, idle: Duration) -> bool {
        if now.duration_since(self.last_seen) <= idle {
            return false;
        }
        if self.breaker.state() != CircuitState::Closed {
            return false;
        }
        self.breaker
            .last_fail_time()
            .is_none_or(|at| now.duration_since(at) > idle)
    }
}

/// Per-destination rate limiter with circuit breaking.
///
/// Cheap to clone; all clones share the same registry.
#[derive(Clone)]
pub struct RateLimiter {
    domains: Arc<RwLock<HashMap<String, Arc<Mutex<DomainEntry>>>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Creates a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        tracing::info!(
            target: TRACING_TARGET,
            requests_per_minute = config.requests_per_minute,
            burst = config.burst,
            max_failures = config.max_failures,
            reset_timeout_secs = config.reset_timeout.as_secs(),
            "rate limiter initialized"
        );

        Self {
            domains: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Decides whether a call to `destination` is admitted right now.
    ///
    /// Never suspends. Circuit state is consulted before the bucket so an
    /// open circuit is not charged tokens.
    pub fn allow(&self, destination: &str) -> Decision {
        let entry = self.entry(destination);
        let decision = entry
            .lock()
            .expect("domain entry lock poisoned")
            .allow(Instant::now());

        if !decision.is_allowed() {
            tracing::debug!(
                target: TRACING_TARGET,
                destination,
                ?decision,
                "admission denied"
            );
        }

        decision
    }

    /// Records a successful call against `destination`.
    pub fn record_success(&self, destination: &str) {
        let entry = self.entry(destination);
        entry
            .lock()
            .expect("domain entry lock poisoned")
            .breaker
            .record_success();
    }

    /// Records a failed call against `destination`.
    pub fn record_failure(&self, destination: &str) {
        let entry = self.entry(destination);
        let mut entry = entry.lock().expect("domain entry lock poisoned");
        entry.failures += 1;
        entry.breaker.record_failure(Instant::now());
    }

    /// Returns the number of tracked destinations.
    pub fn tracked_destinations(&self) -> usize {
        self.domains.read().expect("domain registry lock poisoned").len()
    }

    /// Spawns the idle-entry sweeper, stopping when `cancel` fires.
    ///
    /// Eviction is memory hygiene only: a re-created entry behaves exactly
    /// like first use.
    pub fn spawn_sweeper(&self, cancel: CancellationToken) {
        let domains = Arc::clone(&self.domains);
        let idle = self.config.idle_eviction;
        let period = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let now = Instant::now();
                let mut domains = domains.write().expect("domain registry lock poisoned");
                let before = domains.len();

                domains.retain(|_, entry| {
                    entry
                        .lock()
                        .map(|entry| !entry.evictable(now, idle))
                        .unwrap_or(false)
                });

                let removed = before - domains.len();
                if removed > 0 {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        removed,
                        remaining = domains.len(),
                        "evicted idle destinations"
                    );
                }
            }
        });
    }

    fn entry(&self, destination: &str) -> Arc<Mutex<DomainEntry>> {
        if let Some(entry) = self
            .domains
            .read()
            .expect("domain registry lock poisoned")
            .get(destination)
        {
            return Arc::clone(entry);
        }

        let mut domains = self.domains.write().expect("domain registry lock poisoned");
        Arc::clone(
            domains
                .entry(destination.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(DomainEntry::new(&self.config)))),
        )
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("tracked_destinations", &self.tracked_destinations())
            .finish()
    }
}
