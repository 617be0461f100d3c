//! Push-based traffic counters.
//!
//! Callers record request outcomes and ensemble (chain submission)
//! outcomes from outside the monitor loop; the loop only reads. Everything
//! is atomic so recording never contends with aggregation.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Consecutive ensemble failures tolerated before the dependency is
/// reported disconnected. Independent of any circuit breaker tracking the
/// same dependency.
pub const ENSEMBLE_DISCONNECT_LIMIT: u32 = 5;

#[derive(Debug, Default)]
pub struct RequestCounters {
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    latency_total_ms: AtomicU64,
    ensemble_total: AtomicU64,
    ensemble_consecutive_failures: AtomicU32,
}

impl RequestCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one request outcome with its latency.
    pub fn record_request(&self, success: bool, latency_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.latency_total_ms.fetch_add(latency_ms, Ordering::Relaxed);
        if !success {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one ensemble (chain submission) outcome. A success clears
    /// the consecutive-failure streak.
    pub fn record_ensemble_operation(&self, success: bool) {
        self.ensemble_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.ensemble_consecutive_failures.store(0, Ordering::Relaxed);
        } else {
            self.ensemble_consecutive_failures
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Failed share of all recorded requests; 0.0 before any traffic.
    pub fn error_rate(&self) -> f64 {
        let total = self.requests_total.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            self.requests_failed.load(Ordering::Relaxed) as f64 / total as f64
        }
    }

    /// Mean latency over all recorded requests; 0.0 before any traffic.
    pub fn avg_latency_ms(&self) -> f64 {
        let total = self.requests_total.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            self.latency_total_ms.load(Ordering::Relaxed) as f64 / total as f64
        }
    }

    pub fn ensemble_operations(&self) -> u64 {
        self.ensemble_total.load(Ordering::Relaxed)
    }

    pub fn ensemble_consecutive_failures(&self) -> u32 {
        self.ensemble_consecutive_failures.load(Ordering::Relaxed)
    }

    /// Connected until the consecutive-failure streak exceeds the limit.
    pub fn ensemble_connected(&self) -> bool {
        self.ensemble_consecutive_failures() <= ENSEMBLE_DISCONNECT_LIMIT
    }
}
