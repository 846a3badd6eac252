//! Batch orchestration: the run loop, progress tracking, settlement
//! payloads, and the upward event contract.

pub(crate) mod events;
pub(crate) mod orchestrator;
pub(crate) mod progress;
pub(crate) mod settlement;

pub use events::{BatchSink, RecordingSink};
pub use orchestrator::{
    BatchController, BatchOpts, BatchOrchestrator, BatchOutcome, CancelMode,
};
pub use progress::ProgressTracker;
pub use settlement::Settlement;
