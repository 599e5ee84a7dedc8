//! Per-destination circuit breaker.

use std::time::{Duration, Instant};

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// The circuit is closed and calls are allowed.
    Closed,
    /// The circuit is open and calls are rejected.
    Open,
    /// The circuit is half-open and a limited number of probes are allowed.
    HalfOpen,
}

/// Failure-isolation state machine for one destination.
///
/// All methods require external serialization (the owning registry holds a
/// per-destination lock), which keeps every transition a single atomic step.
#[derive(Debug)]
pub(crate) struct CircuitBreaker {
    state: CircuitState,
    failure_count: u32,
    last_fail_time: Option<Instant>,
    half_open_inflight: u32,
    max_failures: u32,
    reset_timeout: Duration,
    half_open_budget: u32,
}

impl CircuitBreaker {
    pub(crate) fn new(max_failures: u32, reset_timeout: Duration, half_open_budget: u32) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_fail_time: None,
            half_open_inflight: 0,
            max_failures,
            reset_timeout,
            half_open_budget,
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn last_fail_time(&self) -> Option<Instant> {
        self.last_fail_time
    }

    /// Decides whether a call may pass the circuit right now.
    ///
    /// An elapsed reset timeout moves `Open -> HalfOpen` before deciding. In
    /// `HalfOpen` at most `half_open_budget` probes may be in flight; each
    /// admission here counts one until an outcome arrives.
    pub(crate) fn try_acquire(&mut self, now: Instant) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed_reset = self
                    .last_fail_time
                    .is_none_or(|at| now.duration_since(at) > self.reset_timeout);
                if !elapsed_reset {
                    return false;
                }

                tracing::info!(
                    target: crate::TRACING_TARGET,
                    "circuit entering half-open probing"
                );
                self.state = CircuitState::HalfOpen;
                self.half_open_inflight = 1;
                true
            }
            CircuitState::HalfOpen => {
                if self.half_open_inflight >= self.half_open_budget {
                    return false;
                }
                self.half_open_inflight += 1;
                true
            }
        }
    }

    /// Returns an admitted half-open probe slot without an outcome.
    ///
    /// Used when a later admission stage (the token bucket) denies a call
    /// the circuit had already admitted.
    pub(crate) fn release_probe(&mut self) {
        if self.state == CircuitState::HalfOpen {
            self.half_open_inflight = self.half_open_inflight.saturating_sub(1);
        }
    }

    /// Records a successful call.
    ///
    /// A half-open probe success closes the circuit and zeroes the failure
    /// count; success has no effect while closed.
    pub(crate) fn record_success(&mut self) {
        if self.state == CircuitState::HalfOpen {
            tracing::info!(
                target: crate::TRACING_TARGET,
                "circuit closed after successful probe"
            );
            self.state = CircuitState::Closed;
            self.failure_count = 0;
            self.half_open_inflight = 0;
        }
    }

    /// Records a failed call.
    pub(crate) fn record_failure(&mut self, now: Instant) {
        self.failure_count += 1;
        self.last_fail_time = Some(now);

        match self.state {
            CircuitState::HalfOpen => {
                tracing::warn!(
                    target: crate::TRACING_TARGET,
                    "probe failed, circuit re-opening"
                );
                self.state = CircuitState::Open;
                self.half_open_inflight = 0;
            }
            CircuitState::Closed if self.failure_count >= self.max_failures => {
                tracing::warn!(
                    target: crate::TRACING_TARGET,
                    failures = self.failure_count,
                    "failure threshold reached, circuit opening"
                );
                self.state = CircuitState::Open;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(5, Duration::from_secs(30), 3)
    }

    #[test]
    fn opens_after_consecutive_failures() {
        let mut cb = breaker();
        let now = Instant::now();

        for _ in 0..4 {
            cb.record_failure(now);
            assert_eq!(cb.state(), CircuitState::Closed);
        }
        cb.record_failure(now);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.try_acquire(now));
    }

    #[test]
    fn denies_until_reset_timeout_elapses() {
        let mut cb = breaker();
        let now = Instant::now();
        for _ in 0..5 {
            cb.record_failure(now);
        }

        assert!(!cb.try_acquire(now + Duration::from_secs(29)));
        assert!(cb.try_acquire(now + Duration::from_secs(31)));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_budget_bounds_inflight_probes() {
        let mut cb = breaker();
        let now = Instant::now();
        for _ in 0..5 {
            cb.record_failure(now);
        }

        let probe_time = now + Duration::from_secs(31);
        assert!(cb.try_acquire(probe_time));
        assert!(cb.try_acquire(probe_time));
        assert!(cb.try_acquire(probe_time));
        assert!(!cb.try_acquire(probe_time));
    }

    #[test]
    fn probe_success_closes_and_zeroes_failures() {
        let mut cb = breaker();
        let now = Instant::now();
        for _ in 0..5 {
            cb.record_failure(now);
        }

        assert!(cb.try_acquire(now + Duration::from_secs(31)));
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);

        // One more failure must not immediately re-open.
        cb.record_failure(now + Duration::from_secs(32));
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn probe_failure_reopens() {
        let mut cb = breaker();
        let now = Instant::now();
        for _ in 0..5 {
            cb.record_failure(now);
        }

        let probe_time = now + Duration::from_secs(31);
        assert!(cb.try_acquire(probe_time));
        cb.record_failure(probe_time);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.try_acquire(probe_time + Duration::from_secs(1)));
    }
}
