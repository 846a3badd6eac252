//! Fault-tolerance machinery: job error taxonomy, batch-wide circuit
//! breaker, backoff retry scheduling, and fallback placeholders.
//!
//! One instance of each lives per batch orchestrator, constructor-injected
//! rather than process-wide, so parallel batches cannot interfere.

pub(crate) mod breaker;
pub(crate) mod fallback;
pub(crate) mod retry;

pub use breaker::{BreakerOpts, BreakerState, CircuitBreaker};
pub use fallback::FallbackSupplier;
pub use retry::{FailureRecord, RetryOpts, RetryScheduler};

/// Job-level failure taxonomy.
///
/// These never escape a batch as errors: every one of them converts into a
/// settled state, so one bad job cannot abort a batch.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum JobError {
    /// The artifact came back with the wrong content length. Fatal to the
    /// job; never retried.
    #[error("validation failure: expected {expected} content beats, got {actual}")]
    Validation {
        /// Requested content length.
        expected: u32,
        /// Counted content length.
        actual: u32,
    },

    /// The engine produced nothing or failed while building. Retryable.
    #[error("generation failure: {0}")]
    Generation(String),

    /// The renderer failed or produced an invalid image. Retryable.
    #[error("render failure: {0}")]
    Render(String),

    /// The circuit is open: immediate fallback without consuming a retry.
    #[error("system overload: circuit open")]
    Overload,

    /// Session create/destroy failed. Logged; the job fails, the batch
    /// continues.
    #[error("resource failure: {0}")]
    Resource(String),
}

impl JobError {
    /// Whether the retry scheduler may reattempt after this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Generation(_) | JobError::Render(_))
    }
}
