//! stake-guard service entrypoint.
//!
//! # Architecture Overview
//!
//! ```text
//!   incoming request ──▶ security (validate) ──▶ resilience (gate) ──▶ chain SDK
//!                                                      │                   │
//!                                                      ▼                   ▼
//!                                     record_success / record_failure  outcome
//!                                                      │
//!   ┌──────────────────────────────────────────────────┴──────────────┐
//!   │                      Cross-Cutting Concerns                      │
//!   │  ┌────────┐  ┌────────┐  ┌──────────────┐  ┌─────────────────┐  │
//!   │  │ config │  │ health │  │ observability │  │    lifecycle    │  │
//!   │  │        │  │monitor │  │  logs+metrics │  │ shutdown signal │  │
//!   │  └────────┘  └────────┘  └──────────────┘  └─────────────────┘  │
//!   └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Boot order is load-bearing: configuration is loaded and validated
//! before any component that depends on it is constructed. A validation
//! failure ends the process with a non-zero exit before anything else
//! starts.

use std::sync::Arc;

use stake_guard::config::ConfigManager;
use stake_guard::health::{HealthMonitor, MonitorConfig, MonitorEvent};
use stake_guard::observability;
use stake_guard::resilience::{BreakerEvent, CircuitBreaker, CircuitBreakerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::logging::init();
    tracing::info!("stake-guard v0.1.0 starting");

    let config = match ConfigManager::from_env() {
        Ok(config) => Arc::new(config),
        Err(error) => {
            tracing::error!(error = %error, "Configuration rejected, refusing to start");
            std::process::exit(1);
        }
    };

    tracing::info!(
        network = %config.get_or("NETWORK", "?"),
        check_interval_ms = config.get_number_or("CHECK_INTERVAL_MS", 30_000.0) as u64,
        "Configuration loaded"
    );

    if config.get_bool_or("ENABLE_METRICS", true) {
        let port = config.get_number_or("PORT", 8080.0) as u16;
        match format!("0.0.0.0:{port}").parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(error) => tracing::error!(error = %error, "Failed to parse metrics address"),
        }
    }

    let breaker = CircuitBreaker::new("chain-rpc", CircuitBreakerConfig::from_config(&config));
    let monitor = HealthMonitor::new(
        MonitorConfig::from_config(&config),
        Arc::clone(&config),
        Some(Arc::clone(&breaker)),
    );

    // Notification sink: forward alert and breaker events to the log.
    let mut monitor_events = monitor.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = monitor_events.recv().await {
            if let MonitorEvent::Alert(alert) = event {
                tracing::warn!(
                    target: "notifications",
                    kind = %alert.kind,
                    severity = %alert.severity,
                    "{}",
                    alert.message
                );
            }
        }
    });
    let mut breaker_events = breaker.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = breaker_events.recv().await {
            if let BreakerEvent::StateChange { previous, next, .. } = event {
                tracing::info!(
                    target: "notifications",
                    previous = %previous,
                    next = %next,
                    "Dependency gate changed"
                );
            }
        }
    });

    monitor.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    monitor.stop();
    breaker.destroy();

    tracing::info!("Shutdown complete");
    Ok(())
}
