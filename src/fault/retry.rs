use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::fault::JobError;
use crate::foundation::core::JobId;

/// Retry scheduling tuning.
#[derive(Clone, Copy, Debug)]
pub struct RetryOpts {
    /// Attempts after which a job stops retrying and falls back.
    pub max_retries: u32,
    /// Base backoff delay; also the serial drain cadence.
    pub base_delay: Duration,
    /// Backoff ceiling.
    pub max_delay: Duration,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
}

impl Default for RetryOpts {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
        }
    }
}

/// Outstanding-failure bookkeeping for one job. Exists only while the job
/// has unsettled failures; removed once the job settles.
#[derive(Clone, Debug)]
pub struct FailureRecord {
    /// The failing job.
    pub job_id: JobId,
    /// Failures recorded so far.
    pub attempts: u32,
    /// Most recent failure.
    pub last_error: JobError,
    /// When the most recent failure was recorded.
    pub last_attempt: Instant,
    /// Multiplier applied per attempt when computing backoff.
    pub backoff_multiplier: f64,
}

/// Per-job retry bookkeeping plus a drained, time-delayed retry queue.
///
/// The computed exponential delay gates only a job's entry into an idle
/// queue; once the drain timer is running, queued jobs release serially,
/// one per tick, each tick `base_delay` after the previous, so a burst of
/// failures cannot stampede the engine all at once.
#[derive(Debug)]
pub struct RetryScheduler {
    opts: RetryOpts,
    failures: HashMap<JobId, FailureRecord>,
    queue: VecDeque<JobId>,
    next_tick: Option<Instant>,
}

impl RetryScheduler {
    /// Fresh scheduler with an idle queue.
    pub fn new(opts: RetryOpts) -> Self {
        Self {
            opts,
            failures: HashMap::new(),
            queue: VecDeque::new(),
            next_tick: None,
        }
    }

    /// Record one failure for a job.
    pub fn record_failure(&mut self, job: JobId, error: JobError) {
        let mult = self.opts.backoff_multiplier;
        self.failures
            .entry(job)
            .and_modify(|r| {
                r.attempts += 1;
                r.last_error = error.clone();
                r.last_attempt = Instant::now();
            })
            .or_insert_with(|| FailureRecord {
                job_id: job,
                attempts: 1,
                last_error: error,
                last_attempt: Instant::now(),
                backoff_multiplier: mult,
            });
    }

    /// Failures recorded for a job so far.
    pub fn attempts(&self, job: JobId) -> u32 {
        self.failures.get(&job).map(|r| r.attempts).unwrap_or(0)
    }

    /// The failure record for a job, while it has outstanding failures.
    pub fn failure(&self, job: JobId) -> Option<&FailureRecord> {
        self.failures.get(&job)
    }

    /// Whether another attempt is permitted: false once attempts have
    /// reached `max_retries`, and always false while the circuit is open.
    pub fn should_retry(&self, job: JobId, circuit_open: bool) -> bool {
        if circuit_open {
            return false;
        }
        self.attempts(job) < self.opts.max_retries
    }

    /// Backoff delay for a job with the given attempt count:
    /// `min(base_delay * multiplier^(attempts-1), max_delay)`.
    pub fn delay_for_attempts(&self, attempts: u32) -> Duration {
        let exp = attempts.saturating_sub(1);
        let factor = self.opts.backoff_multiplier.powi(exp as i32);
        let delay = self.opts.base_delay.mul_f64(factor.max(0.0));
        delay.min(self.opts.max_delay)
    }

    /// Enqueue a retry for a job that just failed.
    ///
    /// When the queue is idle the drain timer is armed with the job's
    /// computed backoff; otherwise the job simply joins the serial drain.
    pub fn schedule_retry(&mut self, job: JobId, now: Instant) {
        if self.queue.is_empty() && self.next_tick.is_none() {
            let delay = self.delay_for_attempts(self.attempts(job));
            self.next_tick = Some(now + delay);
        }
        self.queue.push_back(job);
    }

    /// Release at most one due retry.
    ///
    /// After a release the timer re-arms `base_delay` ahead for the next
    /// queued job, or disarms when the queue is empty.
    pub fn poll_due(&mut self, now: Instant) -> Option<JobId> {
        let tick = self.next_tick?;
        if now < tick {
            return None;
        }
        let job = self.queue.pop_front();
        self.next_tick = if self.queue.is_empty() {
            None
        } else {
            Some(now + self.opts.base_delay)
        };
        job
    }

    /// When the drain timer next fires, if armed.
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Whether any retries are queued.
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Cancel all pending retries and disarm the timer. Failure records
    /// survive so attempt counts stay accurate.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.next_tick = None;
    }

    /// Forget a settled job entirely: its failure record and any queued
    /// retry. A queued retry for a settled job would be a no-op anyway; this
    /// keeps it from consuming a drain tick.
    pub fn clear_job(&mut self, job: JobId) {
        self.failures.remove(&job);
        self.queue.retain(|j| *j != job);
        if self.queue.is_empty() {
            self.next_tick = None;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fault/retry.rs"]
mod tests;
