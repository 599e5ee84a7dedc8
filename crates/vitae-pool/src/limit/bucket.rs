//! Token bucket for per-destination admission.

use std::time::Instant;

/// Token bucket with a steady refill rate and a short-term burst capacity.
#[derive(Debug, Clone)]
pub(crate) struct TokenBucket {
    /// Number of tokens available
    tokens: f64,
    /// Maximum number of tokens
    capacity: u32,
    /// Token refill rate per second
    refill_rate: f64,
    /// Last refill time
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a full bucket.
    pub(crate) fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            tokens: f64::from(capacity),
            capacity,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    /// Refills tokens based on elapsed time.
    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        let new_tokens = elapsed * self.refill_rate;

        self.tokens = (self.tokens + new_tokens).min(f64::from(self.capacity));
        self.last_refill = now;
    }

    /// Attempts to consume one token.
    pub(crate) fn try_consume(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
