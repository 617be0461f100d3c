//! Circuit breaker for the chain RPC dependency.
//!
//! # States
//! - Closed: normal operation, calls permitted
//! - Open: dependency assumed down, calls blocked
//! - Half-Open: bounded trial calls probe recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: cumulative failures reach failure_threshold
//! Open → Half-Open: one-shot timer fires after open_timeout
//! Half-Open → Closed: a trial call succeeds
//! Half-Open → Open: trial retries exhausted (timer rescheduled)
//! ```
//!
//! # Design Decisions
//! - One breaker per logical dependency, never shared across dependencies
//! - The scheduled timer is the single authoritative Open → Half-Open path;
//!   a generation counter makes stale timers no-ops after reset() or a
//!   re-open, so two recovery paths can never race
//! - The breaker classifies, it never errors: callers consult can_proceed()
//!   and always record the outcome of their own call

use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::ConfigManager;

/// Gate state for one protected dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Breaker tuning. Defaults mirror the configuration schema defaults.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Cumulative failures (while Closed) that trip the circuit.
    pub failure_threshold: u32,

    /// How long the circuit stays Open before the half-open probe window.
    pub open_timeout: Duration,

    /// Failed trial calls tolerated in Half-Open before re-opening.
    pub max_half_open_retries: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(60),
            max_half_open_retries: 3,
        }
    }
}

impl CircuitBreakerConfig {
    /// Read breaker tuning from validated configuration.
    pub fn from_config(config: &ConfigManager) -> Self {
        let defaults = Self::default();
        Self {
            failure_threshold: config
                .get_number_or("FAILURE_THRESHOLD", defaults.failure_threshold as f64)
                as u32,
            open_timeout: Duration::from_millis(config.get_number_or(
                "BREAKER_TIMEOUT_MS",
                defaults.open_timeout.as_millis() as f64,
            ) as u64),
            max_half_open_retries: config.get_number_or(
                "HALF_OPEN_MAX_RETRIES",
                defaults.max_half_open_retries as f64,
            ) as u32,
        }
    }
}

/// Read-only snapshot of breaker counters.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStats {
    pub dependency: String,
    pub state: CircuitState,
    pub failures: u32,
    pub successes: u64,
    pub total_requests: u64,
    pub last_failure_at: Option<SystemTime>,
    pub last_success_at: Option<SystemTime>,
    /// Share of recorded calls that succeeded; 100 before any traffic.
    pub uptime_pct: f64,
}

/// Events observable via [`CircuitBreaker::subscribe`]. Delivery is
/// in-order per receiver; sends never block.
#[derive(Debug, Clone)]
pub enum BreakerEvent {
    StateChange {
        previous: CircuitState,
        next: CircuitState,
        at: SystemTime,
        stats: CircuitBreakerStats,
    },
    HealthCheck {
        stats: CircuitBreakerStats,
    },
}

struct Inner {
    state: CircuitState,
    /// Cumulative while Closed; reset only by Half-Open → Closed or reset().
    failures: u32,
    successes: u64,
    total_requests: u64,
    total_failures: u64,
    half_open_retries: u32,
    /// Bumped on every transition; timers carry the generation they were
    /// scheduled under and stand down on mismatch.
    generation: u64,
    opened_at: Option<tokio::time::Instant>,
    last_failure_at: Option<SystemTime>,
    last_success_at: Option<SystemTime>,
    timer: Option<JoinHandle<()>>,
}

/// Circuit breaker guarding a single named dependency.
pub struct CircuitBreaker {
    dependency: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
    events: broadcast::Sender<BreakerEvent>,
}

impl CircuitBreaker {
    /// Create a breaker for one dependency. Returned in an `Arc` because
    /// the half-open timer task holds a weak reference back to it.
    pub fn new(dependency: impl Into<String>, config: CircuitBreakerConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            dependency: dependency.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                total_requests: 0,
                total_failures: 0,
                half_open_retries: 0,
                generation: 0,
                opened_at: None,
                last_failure_at: None,
                last_success_at: None,
                timer: None,
            }),
            events,
        })
    }

    /// Subscribe to state-change and health events.
    pub fn subscribe(&self) -> broadcast::Receiver<BreakerEvent> {
        self.events.subscribe()
    }

    /// Whether a call may proceed right now.
    pub fn can_proceed(&self) -> bool {
        let inner = self.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => inner.half_open_retries < self.config.max_half_open_retries,
        }
    }

    /// Record a successful call against the dependency.
    pub fn record_success(self: &Arc<Self>) {
        let mut inner = self.lock();
        inner.total_requests += 1;
        inner.successes += 1;
        inner.last_success_at = Some(SystemTime::now());

        if inner.state == CircuitState::HalfOpen {
            inner.failures = 0;
            inner.half_open_retries = 0;
            self.transition(&mut inner, CircuitState::Closed);
        }
    }

    /// Record a failed call against the dependency.
    pub fn record_failure(self: &Arc<Self>) {
        let mut inner = self.lock();
        inner.total_requests += 1;
        inner.total_failures += 1;
        inner.failures = inner.failures.saturating_add(1);
        inner.last_failure_at = Some(SystemTime::now());

        match inner.state {
            CircuitState::Closed => {
                if inner.failures >= self.config.failure_threshold {
                    self.transition(&mut inner, CircuitState::Open);
                    self.schedule_half_open(&mut inner);
                }
            }
            CircuitState::HalfOpen => {
                inner.half_open_retries += 1;
                if inner.half_open_retries >= self.config.max_half_open_retries {
                    self.transition(&mut inner, CircuitState::Open);
                    self.schedule_half_open(&mut inner);
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Counter snapshot.
    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.lock();
        self.stats_locked(&inner)
    }

    /// Share of recorded calls that failed, 0.0 when no traffic yet.
    pub fn failure_rate(&self) -> f64 {
        let inner = self.lock();
        if inner.total_requests == 0 {
            0.0
        } else {
            inner.total_failures as f64 / inner.total_requests as f64
        }
    }

    /// Closed and failing less than 10% of calls.
    pub fn is_healthy(&self) -> bool {
        self.state() == CircuitState::Closed && self.failure_rate() < 0.10
    }

    /// Remaining time until the half-open probe window; zero unless Open.
    pub fn time_until_retry(&self) -> Duration {
        let inner = self.lock();
        match (inner.state, inner.opened_at) {
            (CircuitState::Open, Some(opened_at)) => (opened_at + self.config.open_timeout)
                .saturating_duration_since(tokio::time::Instant::now()),
            _ => Duration::ZERO,
        }
    }

    /// Snapshot the stats and notify subscribers. The health monitor's
    /// breaker probe calls this once per tick.
    pub fn health_snapshot(&self) -> CircuitBreakerStats {
        let stats = self.stats();
        let _ = self.events.send(BreakerEvent::HealthCheck {
            stats: stats.clone(),
        });
        stats
    }

    /// Administrative override: force Closed, zero every counter, cancel
    /// any pending timer.
    pub fn reset(self: &Arc<Self>) {
        let mut inner = self.lock();
        inner.failures = 0;
        inner.successes = 0;
        inner.total_requests = 0;
        inner.total_failures = 0;
        inner.half_open_retries = 0;
        if inner.state != CircuitState::Closed {
            self.transition(&mut inner, CircuitState::Closed);
        } else {
            // Still invalidate any scheduled timer.
            inner.generation += 1;
            Self::cancel_timer(&mut inner);
        }
        tracing::info!(dependency = %self.dependency, "Circuit breaker reset");
    }

    /// Tear down: cancel the pending timer and invalidate its generation so
    /// no late callback can mutate state afterwards.
    pub fn destroy(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        Self::cancel_timer(&mut inner);
        tracing::debug!(dependency = %self.dependency, "Circuit breaker destroyed");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("circuit breaker mutex poisoned")
    }

    fn stats_locked(&self, inner: &Inner) -> CircuitBreakerStats {
        let uptime_pct = if inner.total_requests == 0 {
            100.0
        } else {
            inner.successes as f64 / inner.total_requests as f64 * 100.0
        };
        CircuitBreakerStats {
            dependency: self.dependency.clone(),
            state: inner.state,
            failures: inner.failures,
            successes: inner.successes,
            total_requests: inner.total_requests,
            last_failure_at: inner.last_failure_at,
            last_success_at: inner.last_success_at,
            uptime_pct,
        }
    }

    /// The only place state changes. Bumps the generation, cancels any
    /// pending timer, records the open instant, and notifies subscribers.
    fn transition(&self, inner: &mut Inner, next: CircuitState) {
        let previous = inner.state;
        if previous == next {
            return;
        }

        inner.state = next;
        inner.generation += 1;
        Self::cancel_timer(inner);
        inner.opened_at = (next == CircuitState::Open).then(tokio::time::Instant::now);

        let stats = self.stats_locked(inner);
        tracing::info!(
            dependency = %self.dependency,
            previous = %previous,
            next = %next,
            failures = stats.failures,
            "Circuit breaker state change"
        );
        crate::observability::metrics::record_breaker_state(&self.dependency, next);
        let _ = self.events.send(BreakerEvent::StateChange {
            previous,
            next,
            at: SystemTime::now(),
            stats,
        });
    }

    /// Arm the one-shot Open → Half-Open timer for the current generation.
    fn schedule_half_open(self: &Arc<Self>, inner: &mut Inner) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let generation = inner.generation;
        let timeout = self.config.open_timeout;

        inner.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(breaker) = weak.upgrade() {
                breaker.try_promote_half_open(generation);
            }
        }));
    }

    /// Timer callback. Re-checks that the transition's precondition still
    /// holds: the breaker must still be Open and in the generation the
    /// timer was scheduled under.
    fn try_promote_half_open(&self, scheduled_generation: u64) {
        let mut inner = self.lock();
        if inner.state != CircuitState::Open || inner.generation != scheduled_generation {
            tracing::debug!(
                dependency = %self.dependency,
                "Stale half-open timer ignored"
            );
            return;
        }
        inner.half_open_retries = 0;
        self.transition(&mut inner, CircuitState::HalfOpen);
    }

    fn cancel_timer(inner: &mut Inner) {
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for CircuitBreaker {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            Self::cancel_timer(&mut inner);
        }
    }
}
