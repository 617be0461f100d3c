//! Health monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Callers (gateway, chain submitter):
//!     record_request / record_ensemble_operation
//!     → counters.rs (atomic, read-only for the loop)
//!
//! Monitor tick (monitor.rs):
//!     checks.rs battery (each probe bounded by its own timeout)
//!     → types.rs aggregate (worst-of: fail > warn > pass)
//!     → metrics + threshold alerts
//!     → HealthStatus snapshot + broadcast events
//! ```
//!
//! # Design Decisions
//! - A broken probe fails that probe, never the loop
//! - Overall status is a pure function of the check map
//! - Ensemble liveness is counter-driven, independent of breaker state

pub mod checks;
pub mod counters;
pub mod monitor;
pub mod types;

pub use counters::RequestCounters;
pub use monitor::{AlertThresholds, HealthMonitor, MonitorConfig, MonitorEvent};
pub use types::{
    aggregate, Alert, CheckResult, CheckStatus, HealthMetrics, HealthStatus, OverallHealth,
};
