//! Health reporting types.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use uuid::Uuid;

use crate::security::Severity;

/// Verdict of a single named probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Warn => write!(f, "warn"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Result of one probe, produced fresh on every monitor tick.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: String,
    pub checked_at: SystemTime,
    pub duration: Option<Duration>,
}

impl CheckResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self::with_status(CheckStatus::Pass, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::with_status(CheckStatus::Warn, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::with_status(CheckStatus::Fail, message)
    }

    fn with_status(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            checked_at: SystemTime::now(),
            duration: None,
        }
    }

    pub fn timed(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Worst-of aggregate over the whole check map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for OverallHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Deterministic worst-of rule: any fail → unhealthy, else any warn →
/// degraded, else healthy. Total over every combination of results.
pub fn aggregate(checks: &BTreeMap<String, CheckResult>) -> OverallHealth {
    let mut overall = OverallHealth::Healthy;
    for check in checks.values() {
        match check.status {
            CheckStatus::Fail => return OverallHealth::Unhealthy,
            CheckStatus::Warn => overall = OverallHealth::Degraded,
            CheckStatus::Pass => {}
        }
    }
    overall
}

/// Metrics computed from the push counters and system sampling each tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthMetrics {
    pub requests_total: u64,
    pub error_rate: f64,
    pub avg_latency_ms: f64,
    pub memory_pct: f64,
    pub cpu_pct: f64,
    pub ensemble_operations: u64,
    pub ensemble_consecutive_failures: u32,
    pub ensemble_connected: bool,
}

/// One full aggregation cycle's output.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub overall: OverallHealth,
    pub timestamp: SystemTime,
    pub uptime_secs: u64,
    pub checks: BTreeMap<String, CheckResult>,
    pub metrics: HealthMetrics,
}

/// A threshold violation surfaced to the notification sink.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub kind: String,
    pub severity: Severity,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
    pub at: SystemTime,
}

impl Alert {
    pub fn new(
        kind: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        value: f64,
        threshold: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            severity,
            message: message.into(),
            value,
            threshold,
            at: SystemTime::now(),
        }
    }
}
