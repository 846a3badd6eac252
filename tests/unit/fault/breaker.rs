use super::*;

fn fast_opts() -> BreakerOpts {
    BreakerOpts {
        threshold: 3,
        recovery_timeout: Duration::from_millis(20),
    }
}

#[test]
fn opens_after_exactly_threshold_failures() {
    let mut cb = CircuitBreaker::new(fast_opts());
    cb.record_failure();
    cb.record_failure();
    assert!(!cb.is_open());
    cb.record_failure();
    assert!(cb.is_open());
    assert_eq!(cb.state(), BreakerState::Open);
}

#[test]
fn success_resets_the_streak() {
    let mut cb = CircuitBreaker::new(fast_opts());
    cb.record_failure();
    cb.record_failure();
    cb.record_success();
    cb.record_failure();
    cb.record_failure();
    assert!(!cb.is_open());
    assert_eq!(cb.failure_count(), 2);
}

#[test]
fn recovery_timeout_permits_one_half_open_trial() {
    let mut cb = CircuitBreaker::new(fast_opts());
    for _ in 0..3 {
        cb.record_failure();
    }
    assert!(cb.is_open());

    std::thread::sleep(Duration::from_millis(30));

    // First query after the timeout converts to half-open and lets one
    // attempt through.
    assert!(!cb.is_open());
    assert_eq!(cb.state(), BreakerState::HalfOpen);
    assert!(!cb.is_open());
}

#[test]
fn half_open_success_closes_and_failure_reopens() {
    let mut cb = CircuitBreaker::new(fast_opts());
    for _ in 0..3 {
        cb.record_failure();
    }
    std::thread::sleep(Duration::from_millis(30));
    assert!(!cb.is_open());

    cb.record_success();
    assert_eq!(cb.state(), BreakerState::Closed);

    for _ in 0..3 {
        cb.record_failure();
    }
    std::thread::sleep(Duration::from_millis(30));
    assert!(!cb.is_open());

    // The streak was never reset, so one more failure re-opens immediately.
    cb.record_failure();
    assert!(cb.is_open());
}

#[test]
fn reset_clears_everything() {
    let mut cb = CircuitBreaker::new(fast_opts());
    for _ in 0..5 {
        cb.record_failure();
    }
    cb.reset();
    assert!(!cb.is_open());
    assert_eq!(cb.failure_count(), 0);
    assert_eq!(cb.state(), BreakerState::Closed);
}
