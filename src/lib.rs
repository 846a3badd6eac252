//! Cadenza is a batch artifact-generation and fault-tolerant preview
//! rendering pipeline for sequence notation.
//!
//! Given a parameter set and a count, the pipeline produces N artifacts
//! (generated beat sequences) in isolated scratch sessions, so background
//! generation can never contaminate the shared document the user may be
//! editing, renders each one to a preview image through a worker pool
//! protected by a circuit breaker and exponential-backoff retry, and
//! progressively fills a pre-allocated paginated placeholder grid as jobs
//! settle, in whatever order they settle.
//!
//! # Pipeline overview
//!
//! 1. **Isolate**: [`SessionManager`] snapshots the shared document and
//!    hands each job an empty scratch session
//! 2. **Generate**: [`ArtifactGenerator`] drives the external
//!    [`SequenceEngine`] against the scratch and hard-gates output length
//! 3. **Render**: [`RenderWorkerPool`] dispatches render jobs (cooperatively
//!    or concurrently) and marshals results back to the controlling thread
//! 4. **Settle**: failures route through [`CircuitBreaker`] and
//!    [`RetryScheduler`]; exhausted jobs commit [`FallbackSupplier`] output;
//!    every settlement fills the next open [`PlacementLayout`] slot
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **One controlling context**: all batch-shared state is owned by the
//!   thread running [`BatchOrchestrator::run_batch`]; workers only ever
//!   communicate through marshalled results.
//! - **Jobs never abort batches**: every job-level failure converts to a
//!   settled fallback; only a shared-document preserve/restore failure is
//!   batch-fatal.
//! - **The shared document is sacred**: every generation call is bracketed
//!   by a snapshot/restore guard that runs on success, failure, and unwind.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod batch;
mod document;
mod engine;
mod fault;
mod foundation;
mod generate;
mod layout;
mod notation;
mod render;
mod session;

pub use batch::{
    BatchController, BatchOpts, BatchOrchestrator, BatchOutcome, BatchSink, CancelMode,
    ProgressTracker, RecordingSink, Settlement,
};
pub use document::model::Document;
pub use document::store::{DocumentStore, InMemoryDocumentStore, JsonDocumentStore};
pub use engine::{EngineScript, PreviewImage, RenderOptions, ScriptedEngine, SequenceEngine};
pub use fault::{
    BreakerOpts, BreakerState, CircuitBreaker, FailureRecord, FallbackSupplier, JobError,
    RetryOpts, RetryScheduler,
};
pub use foundation::core::{ArtifactId, BatchId, JobId, SessionId, Size};
pub use foundation::error::{CadenzaError, CadenzaResult};
pub use generate::ArtifactGenerator;
pub use layout::placement::{
    PageShape, PlacementLayout, PlacementSlot, SlotOccupant,
};
pub use layout::scale::{FitContext, TILE_SIZE, compute_scale, grid_dimensions};
pub use notation::artifact::Artifact;
pub use notation::beat::{Beat, BeatRecord, RawSequence, SequenceMetadata};
pub use notation::params::{
    CapType, ContinuityMode, GenerationParams, RotationType, SequenceMode, StartPosition,
};
pub use render::{RenderReply, RenderWorkerPool};
pub use session::{Session, SessionManager, SharedStateGuard};
