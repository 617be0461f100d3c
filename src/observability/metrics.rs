//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_requests_total` (counter): gated requests by outcome
//! - `guard_request_latency_ms` (histogram): request latency distribution
//! - `guard_ensemble_operations_total` (counter): chain submissions by outcome
//! - `guard_breaker_state` (gauge): 0=closed, 1=half-open, 2=open, per dependency
//! - `guard_overall_health` (gauge): 0=healthy, 1=degraded, 2=unhealthy
//! - `guard_alerts_total` (counter): alerts by kind

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::health::OverallHealth;
use crate::resilience::CircuitState;

/// Install the Prometheus exporter. Must run inside the runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(error) => tracing::error!(error = %error, "Failed to install metrics exporter"),
    }
}

pub fn record_request(success: bool, latency_ms: u64) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("guard_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("guard_request_latency_ms").record(latency_ms as f64);
}

pub fn record_ensemble_operation(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("guard_ensemble_operations_total", "outcome" => outcome).increment(1);
}

pub fn record_breaker_state(dependency: &str, state: CircuitState) {
    let code = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    metrics::gauge!("guard_breaker_state", "dependency" => dependency.to_string()).set(code);
}

pub fn record_overall_health(overall: OverallHealth) {
    let code = match overall {
        OverallHealth::Healthy => 0.0,
        OverallHealth::Degraded => 1.0,
        OverallHealth::Unhealthy => 2.0,
    };
    metrics::gauge!("guard_overall_health").set(code);
}

pub fn record_alert(kind: &str) {
    metrics::counter!("guard_alerts_total", "kind" => kind.to_string()).increment(1);
}
