use std::sync::{Arc, OnceLock};
use std::time::Duration;

use cadenza::{
    BatchController, BatchOpts, BatchOrchestrator, CancelMode, GenerationParams,
    InMemoryDocumentStore, JobId, RecordingSink, RetryOpts, ScriptedEngine, Settlement,
};

fn fast_retry() -> RetryOpts {
    RetryOpts {
        max_retries: 2,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
    }
}

fn params() -> GenerationParams {
    GenerationParams {
        length: 4,
        ..GenerationParams::default()
    }
}

/// Engine whose build hook trips the batch controller at a fixed call index.
fn engine_tripping_at(
    call_index: u32,
    trip: impl Fn(&BatchController) + Send + Sync + 'static,
) -> (Arc<ScriptedEngine>, Arc<OnceLock<Arc<BatchController>>>) {
    let slot: Arc<OnceLock<Arc<BatchController>>> = Arc::new(OnceLock::new());
    let hook_slot = Arc::clone(&slot);
    let engine = Arc::new(ScriptedEngine::new().with_build_hook(move |call| {
        if call == call_index {
            if let Some(controller) = hook_slot.get() {
                trip(controller);
            }
        }
    }));
    (engine, slot)
}

#[test]
fn cancel_halts_new_generation_within_one_tick() {
    let (engine, slot) = engine_tripping_at(2, |c| c.cancel());
    let mut orch = BatchOrchestrator::new(
        Arc::clone(&engine) as _,
        Arc::new(InMemoryDocumentStore::new()),
        BatchOpts {
            retry: fast_retry(),
            ..BatchOpts::default()
        },
    );
    slot.set(orch.controller()).unwrap();

    let mut sink = RecordingSink::new();
    let outcome = orch.run_batch(&params(), 5, &mut sink).unwrap();

    assert!(outcome.cancelled);
    assert!(!outcome.success);
    assert_eq!(sink.completed, vec![(outcome.batch_id, false)]);

    // Generation halted after the job whose build tripped the flag: jobs 3
    // and 4 never started and emit no settlement.
    assert_eq!(engine.build_calls(), 3);
    assert_eq!(sink.settled.len(), 3);
    let mut settled: Vec<JobId> = sink.settled.iter().map(|(j, _)| *j).collect();
    settled.sort();
    assert_eq!(settled, vec![JobId(0), JobId(1), JobId(2)]);

    // LeavePartial: the two unstarted slots stay placeholders.
    assert_eq!(outcome.layout.occupied(), 3);
    assert_eq!(outcome.layout.remaining_placeholders(), 2);
}

#[test]
fn cancel_with_force_complete_settles_started_jobs_only() {
    let (engine, slot) = engine_tripping_at(2, |c| c.cancel());
    let mut orch = BatchOrchestrator::new(
        Arc::clone(&engine) as _,
        Arc::new(InMemoryDocumentStore::new()),
        BatchOpts {
            parallel: true,
            threads: Some(2),
            retry: fast_retry(),
            cancel_mode: CancelMode::ForceComplete,
            ..BatchOpts::default()
        },
    );
    slot.set(orch.controller()).unwrap();

    let mut sink = RecordingSink::new();
    let outcome = orch.run_batch(&params(), 5, &mut sink).unwrap();

    assert!(outcome.cancelled);
    assert!(!outcome.success);

    // The three started jobs settle exactly once each: rendered if their
    // result beat the flag check, forced fallback otherwise. The two
    // unstarted jobs emit nothing.
    assert_eq!(sink.settled.len(), 3);
    let mut settled: Vec<JobId> = sink.settled.iter().map(|(j, _)| *j).collect();
    settled.sort();
    assert_eq!(settled, vec![JobId(0), JobId(1), JobId(2)]);
    for (_, settlement) in &sink.settled {
        if let Settlement::Fallback { forced, .. } = settlement {
            assert!(forced);
        }
    }
    assert_eq!(outcome.layout.occupied(), 3);
}

#[test]
fn force_complete_brings_the_batch_to_full_completion() {
    let (engine, slot) = engine_tripping_at(1, |c| c.force_complete());
    let mut orch = BatchOrchestrator::new(
        Arc::clone(&engine) as _,
        Arc::new(InMemoryDocumentStore::new()),
        BatchOpts {
            retry: fast_retry(),
            ..BatchOpts::default()
        },
    );
    slot.set(orch.controller()).unwrap();

    let mut sink = RecordingSink::new();
    let outcome = orch.run_batch(&params(), 5, &mut sink).unwrap();

    // Force-completion reports 100%: every job settled, success stands.
    assert!(!outcome.cancelled);
    assert!(outcome.success);
    assert_eq!(sink.settled.len(), 5);
    assert_eq!(sink.completed, vec![(outcome.batch_id, true)]);
    assert_eq!(outcome.layout.occupied(), 5);
    assert_eq!(outcome.layout.remaining_placeholders(), 0);

    let forced = sink
        .settled
        .iter()
        .filter(|(_, s)| matches!(s, Settlement::Fallback { forced: true, .. }))
        .count();
    assert_eq!(forced, 3);
    assert_eq!(sink.rendered_jobs().len(), 2);
}

#[test]
fn controller_flags_reset_between_batches() {
    let engine = Arc::new(ScriptedEngine::new());
    let mut orch = BatchOrchestrator::new(
        Arc::clone(&engine) as _,
        Arc::new(InMemoryDocumentStore::new()),
        BatchOpts {
            retry: fast_retry(),
            ..BatchOpts::default()
        },
    );

    // A stale cancel from before the run must not poison the next batch.
    orch.controller().cancel();

    let mut sink = RecordingSink::new();
    let outcome = orch.run_batch(&params(), 3, &mut sink).unwrap();
    assert!(outcome.success);
    assert_eq!(sink.settled.len(), 3);
}
