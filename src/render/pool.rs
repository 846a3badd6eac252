use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use crate::engine::SequenceEngine;
use crate::engine::options::RenderOptions;
use crate::engine::preview::PreviewImage;
use crate::fault::JobError;
use crate::foundation::core::JobId;
use crate::foundation::error::{CadenzaError, CadenzaResult};
use crate::notation::beat::RawSequence;

/// One marshalled render result, delivered on the controlling context.
#[derive(Debug)]
pub struct RenderReply {
    /// The job the render belongs to.
    pub job: JobId,
    /// Validated outcome: an image that passed the structural check, or the
    /// failure to route through the fault machinery.
    pub result: Result<PreviewImage, JobError>,
}

enum Dispatch {
    /// One active render at a time, executed inline on the controlling
    /// context between jobs.
    Cooperative { ready: VecDeque<RenderReply> },
    /// One worker task per job on a dedicated pool; results come back over
    /// a channel.
    Concurrent {
        pool: rayon::ThreadPool,
        tx: mpsc::Sender<RenderReply>,
        rx: mpsc::Receiver<RenderReply>,
    },
}

/// Dispatches render jobs and marshals results back to one controlling
/// context.
///
/// Two disciplines implement the same contract: cooperative keeps the
/// caller's thread responsive by rendering one job at a time, concurrent
/// fans out one worker per job. Either way results only ever surface through
/// [`RenderWorkerPool::try_recv`] on the controlling context, at most one
/// render is in flight per job id, and late results from cancelled jobs are
/// dropped silently rather than applied.
pub struct RenderWorkerPool {
    engine: Arc<dyn SequenceEngine>,
    dispatch: Dispatch,
    in_flight: HashSet<JobId>,
    cancelled: HashSet<JobId>,
}

impl RenderWorkerPool {
    /// Cooperative single-active-job pool.
    pub fn cooperative(engine: Arc<dyn SequenceEngine>) -> Self {
        Self {
            engine,
            dispatch: Dispatch::Cooperative {
                ready: VecDeque::new(),
            },
            in_flight: HashSet::new(),
            cancelled: HashSet::new(),
        }
    }

    /// Concurrent pool over dedicated worker threads.
    pub fn concurrent(
        engine: Arc<dyn SequenceEngine>,
        threads: Option<usize>,
    ) -> CadenzaResult<Self> {
        let pool = build_thread_pool(threads)?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            engine,
            dispatch: Dispatch::Concurrent { pool, tx, rx },
            in_flight: HashSet::new(),
            cancelled: HashSet::new(),
        })
    }

    /// Start a render for a job. A second submit while the job is in flight
    /// is ignored: at most one outstanding render per job id.
    pub fn submit(&mut self, job: JobId, raw: RawSequence, opts: RenderOptions) {
        if !self.in_flight.insert(job) {
            tracing::debug!(job = job.0, "render already in flight, submit ignored");
            return;
        }
        self.cancelled.remove(&job);

        match &mut self.dispatch {
            Dispatch::Cooperative { ready } => {
                let result = render_one(&*self.engine, &raw, &opts);
                ready.push_back(RenderReply { job, result });
            }
            Dispatch::Concurrent { pool, tx, .. } => {
                let engine = Arc::clone(&self.engine);
                let tx = tx.clone();
                pool.spawn(move || {
                    let result = render_one(&*engine, &raw, &opts);
                    // Receiver gone means the batch tore down; nothing to do.
                    let _ = tx.send(RenderReply { job, result });
                });
            }
        }
    }

    /// Deliver the next marshalled result, waiting up to `timeout` when the
    /// dispatch is concurrent. Cancelled jobs' results are consumed and
    /// dropped here, never delivered.
    pub fn try_recv(&mut self, timeout: Duration) -> Option<RenderReply> {
        loop {
            let reply = match &mut self.dispatch {
                Dispatch::Cooperative { ready } => ready.pop_front()?,
                Dispatch::Concurrent { rx, .. } => {
                    if self.in_flight.is_empty() {
                        return None;
                    }
                    rx.recv_timeout(timeout).ok()?
                }
            };
            self.in_flight.remove(&reply.job);
            if self.cancelled.remove(&reply.job) {
                tracing::debug!(job = reply.job.0, "dropping late result for cancelled job");
                continue;
            }
            return Some(reply);
        }
    }

    /// Number of renders currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Cancel one job: no new dispatch for it, and any in-flight result is
    /// dropped when it arrives.
    pub fn cancel(&mut self, job: JobId) {
        if self.in_flight.contains(&job) {
            self.cancelled.insert(job);
        }
    }

    /// Best-effort stop: every in-flight job is marked cancelled.
    pub fn cancel_all(&mut self) {
        for job in self.in_flight.iter().copied() {
            self.cancelled.insert(job);
        }
        if let Dispatch::Cooperative { ready } = &mut self.dispatch {
            // Cooperative results are already computed; drop them outright.
            for reply in ready.drain(..) {
                self.in_flight.remove(&reply.job);
                self.cancelled.remove(&reply.job);
            }
        }
    }
}

fn render_one(
    engine: &dyn SequenceEngine,
    raw: &RawSequence,
    opts: &RenderOptions,
) -> Result<PreviewImage, JobError> {
    match engine.render_artifact(raw, opts) {
        Ok(image) if image.is_valid() => Ok(image),
        Ok(image) => Err(JobError::Render(format!(
            "renderer produced an invalid image ({}x{}, {} bytes)",
            image.width,
            image.height,
            image.data.len()
        ))),
        Err(e) => Err(JobError::Render(e.to_string())),
    }
}

fn build_thread_pool(threads: Option<usize>) -> CadenzaResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(CadenzaError::validation(
            "render worker 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| CadenzaError::render(format!("failed to build render thread pool: {e}")))
}
