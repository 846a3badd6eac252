use crate::batch::settlement::Settlement;
use crate::foundation::core::{BatchId, JobId};

/// Event contract between the batch pipeline and whatever sits above it.
///
/// All callbacks run on the controlling context, in order: one
/// `batch_started`, then per job exactly one `job_settled` followed by a
/// `batch_progress`, then one `batch_completed`. Jobs cancelled before their
/// generation started get no `job_settled` at all.
pub trait BatchSink {
    /// A batch began; `total` jobs were allocated placeholder slots.
    fn batch_started(&mut self, batch: BatchId, total: u32);

    /// One job reached its terminal settlement.
    fn job_settled(&mut self, job: JobId, settlement: &Settlement);

    /// Settled-job count advanced.
    fn batch_progress(&mut self, done: u32, total: u32);

    /// The batch finished. `success` is false for cancelled or aborted runs.
    fn batch_completed(&mut self, batch: BatchId, success: bool);
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// `batch_started` events.
    pub started: Vec<(BatchId, u32)>,
    /// `job_settled` events in arrival order.
    pub settled: Vec<(JobId, Settlement)>,
    /// `batch_progress` events.
    pub progress: Vec<(u32, u32)>,
    /// `batch_completed` events.
    pub completed: Vec<(BatchId, bool)>,
}

impl RecordingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs that settled with a real rendered preview.
    pub fn rendered_jobs(&self) -> Vec<JobId> {
        self.settled
            .iter()
            .filter(|(_, s)| s.is_rendered())
            .map(|(j, _)| *j)
            .collect()
    }

    /// Jobs that settled via fallback.
    pub fn fallback_jobs(&self) -> Vec<JobId> {
        self.settled
            .iter()
            .filter(|(_, s)| !s.is_rendered())
            .map(|(j, _)| *j)
            .collect()
    }
}

impl BatchSink for RecordingSink {
    fn batch_started(&mut self, batch: BatchId, total: u32) {
        self.started.push((batch, total));
    }

    fn job_settled(&mut self, job: JobId, settlement: &Settlement) {
        self.settled.push((job, settlement.clone()));
    }

    fn batch_progress(&mut self, done: u32, total: u32) {
        self.progress.push((done, total));
    }

    fn batch_completed(&mut self, batch: BatchId, success: bool) {
        self.completed.push((batch, success));
    }
}
