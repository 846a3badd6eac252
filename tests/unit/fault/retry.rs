use super::*;

fn fast_opts() -> RetryOpts {
    RetryOpts {
        max_retries: 3,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(40),
        backoff_multiplier: 2.0,
    }
}

#[test]
fn backoff_follows_the_formula_and_caps_at_max() {
    let rs = RetryScheduler::new(fast_opts());
    assert_eq!(rs.delay_for_attempts(1), Duration::from_millis(10));
    assert_eq!(rs.delay_for_attempts(2), Duration::from_millis(20));
    assert_eq!(rs.delay_for_attempts(3), Duration::from_millis(40));
    // 10 * 2^3 = 80, capped at 40.
    assert_eq!(rs.delay_for_attempts(4), Duration::from_millis(40));
}

#[test]
fn should_retry_cuts_off_at_max_retries() {
    let mut rs = RetryScheduler::new(fast_opts());
    let job = JobId(1);

    for expected in 1..=3u32 {
        rs.record_failure(job, JobError::Render("boom".into()));
        assert_eq!(rs.attempts(job), expected);
    }
    assert!(!rs.should_retry(job, false));

    let fresh = JobId(2);
    rs.record_failure(fresh, JobError::Render("boom".into()));
    assert!(rs.should_retry(fresh, false));
}

#[test]
fn open_circuit_vetoes_retries_regardless_of_attempts() {
    let mut rs = RetryScheduler::new(fast_opts());
    let job = JobId(1);
    rs.record_failure(job, JobError::Generation("x".into()));
    assert!(rs.should_retry(job, false));
    assert!(!rs.should_retry(job, true));
}

#[test]
fn first_entry_is_gated_by_backoff_then_queue_drains_serially() {
    let mut rs = RetryScheduler::new(fast_opts());
    let now = Instant::now();

    rs.record_failure(JobId(1), JobError::Render("a".into()));
    rs.record_failure(JobId(1), JobError::Render("a".into()));
    rs.schedule_retry(JobId(1), now);
    rs.record_failure(JobId(2), JobError::Render("b".into()));
    rs.schedule_retry(JobId(2), now);

    // Job 1 had 2 attempts: armed at now + 20ms. Nothing before that.
    assert_eq!(rs.poll_due(now), None);
    assert_eq!(rs.poll_due(now + Duration::from_millis(19)), None);

    let t1 = now + Duration::from_millis(20);
    assert_eq!(rs.poll_due(t1), Some(JobId(1)));
    // Job 2 releases one base-delay tick later, not at its own backoff.
    assert_eq!(rs.poll_due(t1), None);
    assert_eq!(rs.poll_due(t1 + Duration::from_millis(10)), Some(JobId(2)));
    assert_eq!(rs.poll_due(t1 + Duration::from_millis(60)), None);
    assert!(!rs.has_pending());
}

#[test]
fn clear_queue_cancels_pending_retries() {
    let mut rs = RetryScheduler::new(fast_opts());
    let now = Instant::now();
    rs.record_failure(JobId(1), JobError::Render("a".into()));
    rs.schedule_retry(JobId(1), now);
    rs.clear_queue();
    assert!(rs.next_wakeup().is_none());
    assert_eq!(rs.poll_due(now + Duration::from_secs(1)), None);
    // Attempt counts survive the cancel.
    assert_eq!(rs.attempts(JobId(1)), 1);
}

#[test]
fn clear_job_removes_record_and_queued_entry() {
    let mut rs = RetryScheduler::new(fast_opts());
    let now = Instant::now();
    rs.record_failure(JobId(1), JobError::Render("a".into()));
    rs.schedule_retry(JobId(1), now);
    rs.clear_job(JobId(1));
    assert_eq!(rs.attempts(JobId(1)), 0);
    assert!(rs.failure(JobId(1)).is_none());
    assert_eq!(rs.poll_due(now + Duration::from_secs(1)), None);
}
