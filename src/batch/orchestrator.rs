use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use kurbo::Size;

use crate::batch::events::BatchSink;
use crate::batch::progress::ProgressTracker;
use crate::batch::settlement::Settlement;
use crate::document::store::DocumentStore;
use crate::engine::SequenceEngine;
use crate::engine::options::RenderOptions;
use crate::fault::{
    BreakerOpts, CircuitBreaker, FallbackSupplier, JobError, RetryOpts, RetryScheduler,
};
use crate::foundation::core::{ArtifactId, BatchId, JobId};
use crate::foundation::error::{CadenzaError, CadenzaResult};
use crate::generate::ArtifactGenerator;
use crate::layout::placement::{PageShape, PlacementLayout};
use crate::layout::scale::{FitContext, compute_scale};
use crate::notation::artifact::Artifact;
use crate::notation::params::GenerationParams;
use crate::render::output::write_preview_png;
use crate::render::pool::{RenderReply, RenderWorkerPool};
use crate::session::SessionManager;

/// What cancellation does with jobs that started but had not settled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CancelMode {
    /// Leave partially-filled pages as they are; unsettled jobs just stop.
    #[default]
    LeavePartial,
    /// Settle every started job with a forced fallback.
    ForceComplete,
}

/// Batch pipeline configuration.
#[derive(Clone, Debug)]
pub struct BatchOpts {
    /// Concurrent dispatch (one worker per render job) when true; otherwise
    /// cooperative single-active-job dispatch.
    pub parallel: bool,
    /// Worker thread count for concurrent dispatch. `None` uses pool
    /// defaults.
    pub threads: Option<usize>,
    /// Grid shape of each placement page.
    pub page_shape: PageShape,
    /// Target cell size thumbnails are scale-fitted into.
    pub cell_size: Size,
    /// Directory preview PNGs are written under. `None` keeps previews
    /// in memory only.
    pub preview_dir: Option<PathBuf>,
    /// Root directory for on-disk session scratch space. `None` keeps
    /// sessions in memory only.
    pub scratch_root: Option<PathBuf>,
    /// Base render toggles; the computed scale-fit is applied on top.
    pub render: RenderOptions,
    /// Circuit breaker tuning.
    pub breaker: BreakerOpts,
    /// Retry scheduling tuning.
    pub retry: RetryOpts,
    /// Cancellation policy for started-but-unsettled jobs.
    pub cancel_mode: CancelMode,
}

impl Default for BatchOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            page_shape: PageShape::default(),
            cell_size: Size::new(400.0, 300.0),
            preview_dir: None,
            scratch_root: None,
            render: RenderOptions::default(),
            breaker: BreakerOpts::default(),
            retry: RetryOpts::default(),
            cancel_mode: CancelMode::default(),
        }
    }
}

/// Shared control handle for a running batch.
///
/// Both flags are sampled cooperatively at safe points in the run loop
/// (between generations, between marshalled results), never preemptively.
#[derive(Debug, Default)]
pub struct BatchController {
    cancel: AtomicBool,
    force: AtomicBool,
}

impl BatchController {
    /// Stop new generate calls and in-flight dispatch at the next safe point.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Settle every pending job with a fallback at the next safe point and
    /// report 100% completion.
    pub fn force_complete(&self) {
        self.force.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Whether force-completion was requested.
    pub fn is_force_completed(&self) -> bool {
        self.force.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.cancel.store(false, Ordering::SeqCst);
        self.force.store(false, Ordering::SeqCst);
    }
}

/// Everything a finished (or cancelled) batch leaves behind.
#[derive(Debug)]
pub struct BatchOutcome {
    /// The batch this outcome belongs to.
    pub batch_id: BatchId,
    /// The placement grid, with every settled job occupying a slot.
    pub layout: PlacementLayout,
    /// Jobs that reached a terminal settlement.
    pub settled: u32,
    /// Whether the run was cancelled mid-flight.
    pub cancelled: bool,
    /// True when every job settled and the run was not cancelled.
    pub success: bool,
}

impl BatchOutcome {
    /// Flip the approval flag on a settled artifact. Returns false when no
    /// settled artifact has that id. This is the approval flow's single
    /// mutation site.
    pub fn set_approved(&mut self, id: ArtifactId, approved: bool) -> bool {
        match self.layout.artifact_mut(id) {
            Some(artifact) => {
                artifact.set_approved(approved);
                true
            }
            None => false,
        }
    }

    /// Release the placement grid and everything in it.
    pub fn clear(&mut self) {
        self.layout.clear();
    }
}

/// Composes sessions, generation, fault tolerance, rendering, and placement
/// into `run_batch`.
///
/// All shared mutable state (breaker, retry queue, layout, progress) lives
/// on the thread that calls [`BatchOrchestrator::run_batch`]; worker results
/// are marshalled onto it before touching any of it. The breaker, retry
/// scheduler, and fallback supplier are owned per orchestrator, so parallel
/// orchestrators cannot interfere.
pub struct BatchOrchestrator {
    engine: Arc<dyn SequenceEngine>,
    sessions: SessionManager,
    generator: ArtifactGenerator,
    breaker: CircuitBreaker,
    retries: RetryScheduler,
    fallbacks: FallbackSupplier,
    opts: BatchOpts,
    controller: Arc<BatchController>,
    next_batch: u64,
}

impl BatchOrchestrator {
    /// Build an orchestrator over an engine and a persistence collaborator.
    ///
    /// Scratch directories orphaned by a previous abnormal termination are
    /// swept here, best-effort.
    pub fn new(
        engine: Arc<dyn SequenceEngine>,
        store: Arc<dyn DocumentStore>,
        opts: BatchOpts,
    ) -> Self {
        let mut sessions = SessionManager::new(store);
        if let Some(root) = &opts.scratch_root {
            sessions = sessions.with_scratch_root(root);
            sessions.sweep_orphans();
        }
        Self {
            generator: ArtifactGenerator::new(Arc::clone(&engine)),
            breaker: CircuitBreaker::new(opts.breaker),
            retries: RetryScheduler::new(opts.retry),
            fallbacks: FallbackSupplier::new(),
            engine,
            sessions,
            opts,
            controller: Arc::new(BatchController::default()),
            next_batch: 0,
        }
    }

    /// The control handle for cancelling or force-completing a run.
    /// Both flags are cleared when a new batch starts.
    pub fn controller(&self) -> Arc<BatchController> {
        Arc::clone(&self.controller)
    }

    /// Produce `count` artifacts and progressively fill the placement grid,
    /// delivering events to `sink` as jobs settle.
    ///
    /// Job-level failures settle as fallbacks and never abort the batch;
    /// only a failure of the shared-document preserve/restore discipline
    /// returns an error, and the shared document is restored to its last
    /// known-good state first.
    #[tracing::instrument(skip(self, sink))]
    pub fn run_batch(
        &mut self,
        params: &GenerationParams,
        count: u32,
        sink: &mut dyn BatchSink,
    ) -> CadenzaResult<BatchOutcome> {
        params.validate()?;
        if count == 0 {
            return Err(CadenzaError::validation("batch count must be > 0"));
        }

        self.controller.reset();
        self.breaker.reset();
        self.retries = RetryScheduler::new(self.opts.retry);
        self.fallbacks.clear();

        let batch_id = BatchId(self.next_batch);
        self.next_batch += 1;

        let pool = if self.opts.parallel {
            RenderWorkerPool::concurrent(Arc::clone(&self.engine), self.opts.threads)?
        } else {
            RenderWorkerPool::cooperative(Arc::clone(&self.engine))
        };

        // One scale-fit for every thumbnail in the batch; all jobs share the
        // requested length.
        let scale = compute_scale(
            self.opts.cell_size,
            params.length,
            self.opts.render.include_start_position,
            FitContext::PageCell,
        );
        let render_opts = self.opts.render.with_scale(scale);

        let jobs = (0..count)
            .map(|i| JobState {
                params: params.varied_for_batch(i),
                stage: Stage::Pending,
                session: None,
                artifact: None,
            })
            .collect();

        let run = BatchRun {
            sessions: &mut self.sessions,
            generator: &mut self.generator,
            breaker: &mut self.breaker,
            retries: &mut self.retries,
            fallbacks: &mut self.fallbacks,
            opts: &self.opts,
            controller: &*self.controller,
            sink,
            pool,
            layout: PlacementLayout::allocate(count, self.opts.page_shape),
            progress: ProgressTracker::new(count),
            jobs,
            render_opts,
            batch_id,
            cancelled: false,
        };
        run.run()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Pending,
    Generating,
    Rendering,
    AwaitingRetry,
    Settled,
    Skipped,
}

#[derive(Debug)]
struct JobState {
    params: GenerationParams,
    stage: Stage,
    session: Option<crate::foundation::core::SessionId>,
    artifact: Option<Artifact>,
}

/// Per-run state. Everything here lives and dies on the controlling thread.
struct BatchRun<'a> {
    sessions: &'a mut SessionManager,
    generator: &'a mut ArtifactGenerator,
    breaker: &'a mut CircuitBreaker,
    retries: &'a mut RetryScheduler,
    fallbacks: &'a mut FallbackSupplier,
    opts: &'a BatchOpts,
    controller: &'a BatchController,
    sink: &'a mut dyn BatchSink,
    pool: RenderWorkerPool,
    layout: PlacementLayout,
    progress: ProgressTracker,
    jobs: Vec<JobState>,
    render_opts: RenderOptions,
    batch_id: BatchId,
    cancelled: bool,
}

impl BatchRun<'_> {
    fn run(mut self) -> CadenzaResult<BatchOutcome> {
        self.sink
            .batch_started(self.batch_id, self.jobs.len() as u32);

        let result = self.drive();

        // Finalize on every exit path: sessions and transient retry state
        // never outlive the run.
        self.sessions.destroy_all();
        self.retries.clear_queue();
        self.pool.cancel_all();

        let success = result.is_ok() && !self.cancelled && self.progress.is_complete();
        self.sink.batch_completed(self.batch_id, success);
        result?;

        Ok(BatchOutcome {
            batch_id: self.batch_id,
            layout: self.layout,
            settled: self.progress.done(),
            cancelled: self.cancelled,
            success,
        })
    }

    fn drive(&mut self) -> CadenzaResult<()> {
        let count = self.jobs.len() as u32;
        let mut next_gen = 0u32;

        loop {
            // Safe point: control flags are sampled between units of work.
            if self.controller.is_force_completed() {
                self.force_complete_remaining();
                return Ok(());
            }
            if self.controller.is_cancelled() {
                self.cancel_remaining();
                self.cancelled = true;
                return Ok(());
            }

            if next_gen < count {
                let job = JobId(next_gen);
                next_gen += 1;
                self.start_job(job)?;
            }

            // Marshal whatever results are already waiting.
            while let Some(reply) = self.pool.try_recv(Duration::ZERO) {
                self.handle_reply(reply)?;
            }

            let now = Instant::now();
            while let Some(job) = self.retries.poll_due(now) {
                self.fire_retry(job)?;
            }

            if self.progress.is_complete() {
                return Ok(());
            }

            if next_gen >= count {
                let wait = self.idle_wait();
                if self.pool.in_flight() > 0 {
                    if let Some(reply) = self.pool.try_recv(wait) {
                        self.handle_reply(reply)?;
                    }
                } else if self.retries.has_pending() {
                    std::thread::sleep(wait);
                } else {
                    // Every settle path either completes, queues a retry, or
                    // leaves a render in flight; reaching here means a job
                    // leaked. Fail safe instead of spinning.
                    debug_assert!(false, "batch stalled with unsettled jobs");
                    tracing::warn!("batch stalled with unsettled jobs; force-completing");
                    self.force_complete_remaining();
                    return Ok(());
                }
            }
        }
    }

    fn idle_wait(&self) -> Duration {
        let cap = Duration::from_millis(20);
        match self.retries.next_wakeup() {
            Some(due) => due
                .saturating_duration_since(Instant::now())
                .clamp(Duration::from_millis(1), cap),
            None => cap,
        }
    }

    fn start_job(&mut self, job: JobId) -> CadenzaResult<()> {
        self.jobs[job.0 as usize].stage = Stage::Generating;
        match self.sessions.create_session() {
            Ok(session) => {
                self.jobs[job.0 as usize].session = Some(session);
                self.generate_in_session(job)
            }
            Err(e) => {
                tracing::warn!(job = job.0, error = %e, "session create failed");
                self.settle_fallback(job, JobError::Resource(e.to_string()), None, false);
                Ok(())
            }
        }
    }

    /// Run one generation inside the job's session, bracketed by the
    /// shared-document preserve/restore guard. The guard restores on drop,
    /// so an engine panic cannot leave the user's work perturbed.
    fn generate_in_session(&mut self, job: JobId) -> CadenzaResult<()> {
        let idx = job.0 as usize;
        let Some(session) = self.jobs[idx].session else {
            self.settle_fallback(
                job,
                JobError::Resource("job has no session".to_owned()),
                None,
                false,
            );
            return Ok(());
        };

        let guard = self.sessions.preserve_shared_state()?;
        let result = match self.sessions.scratch_mut(session) {
            Some(scratch) => Some(self.generator.generate(&self.jobs[idx].params, scratch)),
            None => None,
        };
        guard.restore()?;

        match result {
            Some(Ok(artifact)) => {
                self.dispatch_render(job, artifact);
                Ok(())
            }
            Some(Err(e)) => {
                self.route_failure(job, e, None);
                Ok(())
            }
            None => {
                self.settle_fallback(
                    job,
                    JobError::Resource("session scratch disappeared".to_owned()),
                    None,
                    false,
                );
                Ok(())
            }
        }
    }

    fn dispatch_render(&mut self, job: JobId, artifact: Artifact) {
        // Overload short-circuits before dispatch and consumes no retry.
        if self.breaker.is_open() {
            self.settle_fallback(job, JobError::Overload, Some(artifact), false);
            return;
        }
        let idx = job.0 as usize;
        self.jobs[idx].stage = Stage::Rendering;
        self.pool
            .submit(job, artifact.raw().clone(), self.render_opts.clone());
        self.jobs[idx].artifact = Some(artifact);
    }

    fn handle_reply(&mut self, reply: RenderReply) -> CadenzaResult<()> {
        let job = reply.job;
        let idx = job.0 as usize;
        if self.jobs[idx].stage != Stage::Rendering {
            tracing::debug!(job = job.0, "ignoring stale render result");
            return Ok(());
        }

        match reply.result {
            Ok(image) => {
                self.breaker.record_success();
                let Some(mut artifact) = self.jobs[idx].artifact.take() else {
                    self.settle_fallback(
                        job,
                        JobError::Render("render result without a pending artifact".to_owned()),
                        None,
                        false,
                    );
                    return Ok(());
                };
                if let Some(dir) = &self.opts.preview_dir {
                    match write_preview_png(dir, job, artifact.word(), &image) {
                        Ok(path) => artifact.set_render_path(path),
                        Err(e) => {
                            self.route_failure(
                                job,
                                JobError::Render(format!("preview write failed: {e}")),
                                Some(artifact),
                            );
                            return Ok(());
                        }
                    }
                }
                self.settle(job, Settlement::Rendered { artifact, image });
            }
            Err(e) => {
                let artifact = self.jobs[idx].artifact.take();
                self.route_failure(job, e, artifact);
            }
        }
        Ok(())
    }

    fn route_failure(&mut self, job: JobId, error: JobError, artifact: Option<Artifact>) {
        if !error.is_retryable() {
            if matches!(error, JobError::Resource(_)) {
                tracing::warn!(job = job.0, error = %error, "resource failure");
            }
            self.settle_fallback(job, error, artifact, false);
            return;
        }

        self.breaker.record_failure();
        self.retries.record_failure(job, error.clone());
        let circuit_open = self.breaker.is_open();
        if self.retries.should_retry(job, circuit_open) {
            let idx = job.0 as usize;
            self.jobs[idx].stage = Stage::AwaitingRetry;
            self.jobs[idx].artifact = artifact;
            self.retries.schedule_retry(job, Instant::now());
        } else {
            self.settle_fallback(job, error, artifact, false);
        }
    }

    /// A due retry resumes the job at the stage that failed: re-render when
    /// an artifact is parked, regenerate otherwise. Retries for settled jobs
    /// or torn-down sessions are safe no-ops.
    fn fire_retry(&mut self, job: JobId) -> CadenzaResult<()> {
        let idx = job.0 as usize;
        if self.jobs[idx].stage != Stage::AwaitingRetry {
            return Ok(());
        }
        let Some(session) = self.jobs[idx].session else {
            return Ok(());
        };
        if self.sessions.session(session).is_none() {
            return Ok(());
        }

        if self.breaker.is_open() {
            let artifact = self.jobs[idx].artifact.take();
            self.settle_fallback(job, JobError::Overload, artifact, false);
            return Ok(());
        }

        match self.jobs[idx].artifact.take() {
            Some(artifact) => {
                self.dispatch_render(job, artifact);
                Ok(())
            }
            None => {
                self.jobs[idx].stage = Stage::Generating;
                self.generate_in_session(job)
            }
        }
    }

    fn settle(&mut self, job: JobId, settlement: Settlement) {
        let idx = job.0 as usize;
        self.jobs[idx].stage = Stage::Settled;
        self.jobs[idx].artifact = None;
        if let Some(session) = self.jobs[idx].session.take() {
            self.sessions.destroy_session(session);
        }
        self.retries.clear_job(job);

        let (done, total) = self.progress.advance();
        self.sink.job_settled(job, &settlement);
        self.layout.replace_next(settlement);
        self.sink.batch_progress(done, total);
    }

    fn settle_fallback(
        &mut self,
        job: JobId,
        error: JobError,
        artifact: Option<Artifact>,
        forced: bool,
    ) {
        let image = self.fallbacks.get_or_create_placeholder(job);
        self.settle(
            job,
            Settlement::Fallback {
                artifact,
                error,
                image,
                forced,
            },
        );
    }

    /// Synchronously settle every pending job, started or not, with a
    /// forced fallback, bringing progress to 100%.
    fn force_complete_remaining(&mut self) {
        self.pool.cancel_all();
        self.retries.clear_queue();
        for i in 0..self.jobs.len() {
            if matches!(self.jobs[i].stage, Stage::Settled | Stage::Skipped) {
                continue;
            }
            let job = JobId(i as u32);
            let artifact = self.jobs[i].artifact.take();
            let error = self
                .retries
                .failure(job)
                .map(|r| r.last_error.clone())
                .unwrap_or_else(|| {
                    JobError::Generation("force-completed before finishing".to_owned())
                });
            self.settle_fallback(job, error, artifact, true);
        }
    }

    /// Stop dispatch. Jobs whose generation never started are skipped
    /// silently and emit no settlement event.
    fn cancel_remaining(&mut self) {
        self.pool.cancel_all();
        self.retries.clear_queue();
        for i in 0..self.jobs.len() {
            match self.jobs[i].stage {
                Stage::Settled | Stage::Skipped => {}
                Stage::Pending => self.jobs[i].stage = Stage::Skipped,
                Stage::Generating | Stage::Rendering | Stage::AwaitingRetry => {
                    match self.opts.cancel_mode {
                        CancelMode::LeavePartial => self.jobs[i].stage = Stage::Skipped,
                        CancelMode::ForceComplete => {
                            let job = JobId(i as u32);
                            let artifact = self.jobs[i].artifact.take();
                            let error = self
                                .retries
                                .failure(job)
                                .map(|r| r.last_error.clone())
                                .unwrap_or_else(|| {
                                    JobError::Generation("batch cancelled".to_owned())
                                });
                            self.settle_fallback(job, error, artifact, true);
                        }
                    }
                }
            }
        }
    }
}
