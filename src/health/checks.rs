//! The fixed probe battery.
//!
//! Every probe is bounded by the monitor's per-check budget, so one slow
//! probe can never stall the rest of the aggregation. Probes report their
//! own failure modes as results; an `Err` from a probe means something
//! unexpected broke inside it, and the monitor converts that into a fail
//! verdict for that probe alone.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::schema::RPC_URL_KEY;
use crate::config::ConfigManager;
use crate::health::counters::{RequestCounters, ENSEMBLE_DISCONNECT_LIMIT};
use crate::health::monitor::AlertThresholds;
use crate::health::types::CheckResult;
use crate::resilience::{CircuitBreaker, CircuitState};
use crate::security::patterns;

/// Memory share at which the memory probe hard-fails, regardless of the
/// configured warn threshold.
pub const MEMORY_FAIL_PCT: f64 = 95.0;

/// Everything the battery needs to run one cycle.
pub struct CheckContext {
    pub config: Arc<ConfigManager>,
    pub breaker: Option<Arc<CircuitBreaker>>,
    pub counters: Arc<RequestCounters>,
    pub thresholds: AlertThresholds,
    pub http: reqwest::Client,
    pub system: Mutex<sysinfo::System>,
    pub started_at: Instant,
}

impl CheckContext {
    /// Sample process-visible memory and CPU usage, as percentages.
    pub fn sample_system(&self) -> (f64, f64) {
        let mut system = self.system.lock().expect("system sampler mutex poisoned");
        system.refresh_memory();
        system.refresh_cpu_usage();

        let total = system.total_memory();
        let memory_pct = if total == 0 {
            0.0
        } else {
            system.used_memory() as f64 / total as f64 * 100.0
        };
        (memory_pct, f64::from(system.global_cpu_usage()))
    }
}

/// Probe names, in execution order. The breaker probe only runs when a
/// breaker was injected.
pub fn battery(ctx: &CheckContext) -> Vec<&'static str> {
    let mut names = vec![
        "network",
        "configuration",
        "security_posture",
        "memory",
        "uptime",
        "ensemble",
    ];
    if ctx.breaker.is_some() {
        names.push("circuit_breaker");
    }
    names
}

/// Run one named probe.
pub async fn run_check(ctx: &CheckContext, name: &str) -> Result<CheckResult, String> {
    match name {
        "network" => check_network(ctx).await,
        "configuration" => check_configuration(ctx),
        "security_posture" => check_security_posture(ctx),
        "memory" => check_memory(ctx),
        "uptime" => check_uptime(ctx),
        "ensemble" => check_ensemble(ctx),
        "circuit_breaker" => check_breaker(ctx),
        other => Err(format!("unknown check '{other}'")),
    }
}

/// Reachability of the configured RPC endpoint. Any HTTP response counts
/// as connectivity; only transport errors fail the probe.
async fn check_network(ctx: &CheckContext) -> Result<CheckResult, String> {
    let endpoint = ctx
        .config
        .get(RPC_URL_KEY)
        .map_err(|e| format!("rpc endpoint unavailable: {e}"))?;

    match ctx.http.get(&endpoint).send().await {
        Ok(response) => Ok(CheckResult::pass(format!(
            "endpoint reachable ({})",
            response.status()
        ))),
        Err(error) => {
            tracing::warn!(endpoint = %endpoint, error = %error, "Network probe failed");
            Ok(CheckResult::fail(format!("endpoint unreachable: {error}")))
        }
    }
}

/// Configuration validity via the runtime security re-check.
fn check_configuration(ctx: &CheckContext) -> Result<CheckResult, String> {
    let report = ctx.config.validate_security();
    if report.is_valid {
        Ok(CheckResult::pass("configuration valid"))
    } else {
        Ok(CheckResult::fail(report.errors.join("; ")))
    }
}

/// Security posture: deny-lists compiled and the gas ceiling configured
/// inside its legal range.
fn check_security_posture(ctx: &CheckContext) -> Result<CheckResult, String> {
    let (sql, xss) = patterns::table_sizes();
    if sql == 0 || xss == 0 {
        return Ok(CheckResult::fail("injection deny-lists are empty"));
    }

    let gas = ctx
        .config
        .get_number(crate::config::schema::MAX_GAS_GWEI_KEY)
        .map_err(|e| e.to_string())?;
    match crate::config::schema::numeric_range(crate::config::schema::MAX_GAS_GWEI_KEY) {
        Some(spec) if gas < spec.min || gas > spec.max => Ok(CheckResult::fail(format!(
            "gas ceiling {gas} gwei outside [{}, {}]",
            spec.min, spec.max
        ))),
        _ => Ok(CheckResult::pass(format!(
            "deny-lists loaded ({sql} sql, {xss} xss), gas ceiling {gas} gwei"
        ))),
    }
}

/// Process memory usage: warn at the configured threshold, fail at
/// [`MEMORY_FAIL_PCT`].
fn check_memory(ctx: &CheckContext) -> Result<CheckResult, String> {
    let (memory_pct, _) = ctx.sample_system();
    let message = format!("memory usage {memory_pct:.1}%");
    let result = if memory_pct >= MEMORY_FAIL_PCT {
        CheckResult::fail(message)
    } else if memory_pct >= ctx.thresholds.memory_pct {
        CheckResult::warn(message)
    } else {
        CheckResult::pass(message)
    };
    Ok(result)
}

/// Informational process uptime.
fn check_uptime(ctx: &CheckContext) -> Result<CheckResult, String> {
    Ok(CheckResult::pass(format!(
        "process up {}s",
        ctx.started_at.elapsed().as_secs()
    )))
}

/// Ensemble (chain submission) liveness from the push counters.
fn check_ensemble(ctx: &CheckContext) -> Result<CheckResult, String> {
    let streak = ctx.counters.ensemble_consecutive_failures();
    if ctx.counters.ensemble_connected() {
        Ok(CheckResult::pass(format!(
            "connected ({} operations recorded)",
            ctx.counters.ensemble_operations()
        )))
    } else {
        Ok(CheckResult::fail(format!(
            "disconnected: {streak} consecutive failures (limit {ENSEMBLE_DISCONNECT_LIMIT})"
        )))
    }
}

/// Injected circuit breaker state: Closed passes, Half-Open warns while
/// recovery is probed, Open fails.
fn check_breaker(ctx: &CheckContext) -> Result<CheckResult, String> {
    let breaker = ctx
        .breaker
        .as_ref()
        .ok_or_else(|| "no breaker injected".to_string())?;

    let stats = breaker.health_snapshot();
    let message = format!(
        "{}: {} ({} failures, {:.1}% uptime)",
        stats.dependency, stats.state, stats.failures, stats.uptime_pct
    );
    let result = match stats.state {
        CircuitState::Closed => CheckResult::pass(message),
        CircuitState::HalfOpen => CheckResult::warn(message),
        CircuitState::Open => CheckResult::fail(message),
    };
    Ok(result)
}
