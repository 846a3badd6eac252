use std::time::{Duration, Instant};

/// Circuit breaker tuning.
#[derive(Clone, Copy, Debug)]
pub struct BreakerOpts {
    /// Consecutive failures that trip the circuit open.
    pub threshold: u32,
    /// Cool-down before an open circuit permits a trial attempt.
    pub recovery_timeout: Duration,
}

impl Default for BreakerOpts {
    fn default() -> Self {
        Self {
            threshold: 5,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

/// Circuit state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal dispatch.
    #[default]
    Closed,
    /// Dispatch halted until the recovery timeout elapses.
    Open,
    /// One trial attempt permitted.
    HalfOpen,
}

/// Batch-wide failure-rate throttle.
///
/// One instance is shared across an entire batch, not per job: a failure
/// streak anywhere throttles all subsequent dispatch. The OPEN → HALF_OPEN
/// transition is lazy: it happens on the next [`CircuitBreaker::is_open`]
/// query after the timeout elapses, which then returns false exactly once to
/// let the trial attempt through.
#[derive(Debug)]
pub struct CircuitBreaker {
    opts: BreakerOpts,
    failure_count: u32,
    last_failure: Option<Instant>,
    state: BreakerState,
}

impl CircuitBreaker {
    /// Fresh closed breaker.
    pub fn new(opts: BreakerOpts) -> Self {
        Self {
            opts,
            failure_count: 0,
            last_failure: None,
            state: BreakerState::Closed,
        }
    }

    /// Record a successful attempt: the failure streak resets, and a
    /// half-open trial closes the circuit.
    pub fn record_success(&mut self) {
        self.failure_count = 0;
        if self.state == BreakerState::HalfOpen {
            self.state = BreakerState::Closed;
        }
    }

    /// Record a failed attempt, opening the circuit once the streak reaches
    /// the threshold. A failure during a half-open trial re-opens
    /// immediately because the streak was never reset.
    pub fn record_failure(&mut self) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure = Some(Instant::now());
        if self.failure_count >= self.opts.threshold {
            self.state = BreakerState::Open;
        }
    }

    /// Whether dispatch is currently throttled.
    ///
    /// An open circuit whose recovery timeout has elapsed converts to
    /// half-open and reports false, permitting exactly one trial attempt.
    pub fn is_open(&mut self) -> bool {
        match self.state {
            BreakerState::Open => {
                let elapsed = self
                    .last_failure
                    .map(|t| t.elapsed() >= self.opts.recovery_timeout)
                    .unwrap_or(true);
                if elapsed {
                    self.state = BreakerState::HalfOpen;
                    false
                } else {
                    true
                }
            }
            BreakerState::Closed | BreakerState::HalfOpen => false,
        }
    }

    /// Manual override back to a fresh closed state.
    pub fn reset(&mut self) {
        self.failure_count = 0;
        self.last_failure = None;
        self.state = BreakerState::Closed;
    }

    /// Current state, without the lazy conversion applied.
    pub fn state(&self) -> BreakerState {
        self.state
    }

    /// Current consecutive-failure count.
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fault/breaker.rs"]
mod tests;
