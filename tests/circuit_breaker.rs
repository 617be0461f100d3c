//! Timer-driven circuit breaker behavior under a paused clock.

use std::time::Duration;

use stake_guard::resilience::{
    BreakerEvent, BreakerRegistry, CircuitBreaker, CircuitBreakerConfig, CircuitState,
};

fn config(threshold: u32, timeout_secs: u64) -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold: threshold,
        open_timeout: Duration::from_secs(timeout_secs),
        max_half_open_retries: 3,
    }
}

#[tokio::test(start_paused = true)]
async fn test_full_recovery_lifecycle() {
    let breaker = CircuitBreaker::new("chain-rpc", config(5, 60));
    let mut events = breaker.subscribe();

    // Five consecutive failures trip the circuit, not one earlier.
    for _ in 0..4 {
        breaker.record_failure();
        assert!(breaker.can_proceed());
    }
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);
    assert!(!breaker.can_proceed());

    // Timer promotes to half-open after the open timeout.
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_secs(60)).await;
    tokio::task::yield_now().await;
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert!(breaker.can_proceed());

    // One trial success closes the circuit with counters cleared.
    breaker.record_success();
    let stats = breaker.stats();
    assert_eq!(stats.state, CircuitState::Closed);
    assert_eq!(stats.failures, 0);

    // Events arrived in transition order.
    let mut transitions = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let BreakerEvent::StateChange { previous, next, .. } = event {
            transitions.push((previous, next));
        }
    }
    assert_eq!(
        transitions,
        vec![
            (CircuitState::Closed, CircuitState::Open),
            (CircuitState::Open, CircuitState::HalfOpen),
            (CircuitState::HalfOpen, CircuitState::Closed),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_time_until_retry_counts_down() {
    let breaker = CircuitBreaker::new("chain-rpc", config(1, 60));
    assert_eq!(breaker.time_until_retry(), Duration::ZERO);

    breaker.record_failure();
    let remaining = breaker.time_until_retry();
    assert!(remaining > Duration::from_secs(59));

    tokio::time::advance(Duration::from_secs(20)).await;
    let remaining = breaker.time_until_retry();
    assert!(remaining <= Duration::from_secs(40));
    assert!(remaining > Duration::from_secs(39));
}

#[tokio::test(start_paused = true)]
async fn test_reset_during_open_discards_pending_timer() {
    let breaker = CircuitBreaker::new("chain-rpc", config(1, 60));
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);

    breaker.reset();
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert!(breaker.can_proceed());

    // A manually-reset breaker must never be resurrected into half-open
    // by the timer it cancelled.
    tokio::time::advance(Duration::from_secs(300)).await;
    tokio::task::yield_now().await;
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_probe_window_reopens_and_rearms() {
    let breaker = CircuitBreaker::new("chain-rpc", config(1, 30));
    breaker.record_failure();
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_secs(30)).await;
    tokio::task::yield_now().await;
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    // Burn through the trial budget.
    breaker.record_failure();
    breaker.record_failure();
    assert!(breaker.can_proceed());
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);
    assert!(!breaker.can_proceed());

    // The rearmed timer opens a fresh probe window with a fresh budget.
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_secs(30)).await;
    tokio::task::yield_now().await;
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert!(breaker.can_proceed());
}

#[tokio::test(start_paused = true)]
async fn test_destroyed_breaker_ignores_late_timer() {
    let breaker = CircuitBreaker::new("chain-rpc", config(1, 10));
    breaker.record_failure();
    breaker.destroy();

    tokio::time::advance(Duration::from_secs(60)).await;
    tokio::task::yield_now().await;
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_registry_isolates_dependencies() {
    let registry = BreakerRegistry::new(config(2, 60));
    let rpc = registry.get_or_create("chain-rpc");
    let relayer = registry.get_or_create("relayer");

    rpc.record_failure();
    rpc.record_failure();
    assert_eq!(rpc.state(), CircuitState::Open);
    assert_eq!(relayer.state(), CircuitState::Closed);
    assert!(relayer.can_proceed());

    registry.destroy_all();
}
