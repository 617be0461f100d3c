//! Periodic health aggregation and alerting.
//!
//! One tick: run the probe battery (each probe individually bounded),
//! fold the results into a worst-of overall status, compute metrics from
//! the push counters, compare against thresholds, and notify subscribers.
//! A probe that errors or times out becomes a fail verdict for that probe
//! only; the loop itself never dies.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant, SystemTime};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::ConfigManager;
use crate::health::checks::{self, CheckContext};
use crate::health::counters::RequestCounters;
use crate::health::types::{aggregate, Alert, CheckResult, HealthMetrics, HealthStatus, OverallHealth};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::resilience::CircuitBreaker;
use crate::security::Severity;

/// Alerting thresholds compared against each tick's metrics.
#[derive(Debug, Clone)]
pub struct AlertThresholds {
    /// Failed share of requests, 0.0 - 1.0.
    pub error_rate: f64,
    /// Mean request latency in milliseconds.
    pub response_time_ms: f64,
    /// Memory usage percentage.
    pub memory_pct: f64,
    /// CPU usage percentage.
    pub cpu_pct: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            error_rate: 0.1,
            response_time_ms: 1_000.0,
            memory_pct: 85.0,
            cpu_pct: 90.0,
        }
    }
}

/// Monitor tuning.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub check_interval: Duration,
    pub enable_metrics: bool,
    pub enable_alerting: bool,
    pub thresholds: AlertThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(30),
            enable_metrics: true,
            enable_alerting: true,
            thresholds: AlertThresholds::default(),
        }
    }
}

impl MonitorConfig {
    /// Read monitor tuning from validated configuration.
    pub fn from_config(config: &ConfigManager) -> Self {
        let defaults = Self::default();
        Self {
            check_interval: Duration::from_millis(config.get_number_or(
                "CHECK_INTERVAL_MS",
                defaults.check_interval.as_millis() as f64,
            ) as u64),
            enable_metrics: config.get_bool_or("ENABLE_METRICS", defaults.enable_metrics),
            enable_alerting: config.get_bool_or("ENABLE_ALERTING", defaults.enable_alerting),
            thresholds: defaults.thresholds,
        }
    }
}

/// Events observable via [`HealthMonitor::subscribe`].
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A full aggregation cycle completed.
    HealthCheck(HealthStatus),
    /// An individual probe errored or timed out.
    CheckError { check: String, error: String },
    /// A threshold was violated or overall health collapsed.
    Alert(Alert),
}

/// Periodic aggregator over the probe battery.
pub struct HealthMonitor {
    config: MonitorConfig,
    ctx: Arc<CheckContext>,
    status: RwLock<Option<HealthStatus>>,
    events: broadcast::Sender<MonitorEvent>,
    shutdown: Shutdown,
    task: Mutex<Option<JoinHandle<()>>>,
    started_at: Instant,
}

impl HealthMonitor {
    /// Build a monitor over the given configuration and optional breaker.
    pub fn new(
        config: MonitorConfig,
        app_config: Arc<ConfigManager>,
        breaker: Option<Arc<CircuitBreaker>>,
    ) -> Arc<Self> {
        // Probe timeout must stay strictly below the tick interval so a
        // stuck probe cannot push one cycle into the next.
        let probe_budget = probe_budget(config.check_interval);
        let http = reqwest::Client::builder()
            .timeout(probe_budget)
            .build()
            .unwrap_or_default();

        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            ctx: Arc::new(CheckContext {
                config: app_config,
                breaker,
                counters: Arc::new(RequestCounters::new()),
                thresholds: config.thresholds.clone(),
                http,
                system: Mutex::new(sysinfo::System::new()),
                started_at: Instant::now(),
            }),
            config,
            status: RwLock::new(None),
            events,
            shutdown: Shutdown::new(),
            task: Mutex::new(None),
            started_at: Instant::now(),
        })
    }

    /// Subscribe to health, check-error, and alert events.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Begin the periodic loop. The first cycle runs immediately.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock().expect("monitor task mutex poisoned");
        if task.is_some() {
            tracing::warn!("Health monitor already started");
            return;
        }

        tracing::info!(
            interval_ms = self.config.check_interval.as_millis() as u64,
            alerting = self.config.enable_alerting,
            "Health monitor starting"
        );

        let monitor = Arc::clone(self);
        let mut shutdown_rx = self.shutdown.subscribe();
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.config.check_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        monitor.run_cycle().await;
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Health monitor received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        }));
    }

    /// Cancel the periodic loop. Safe to call repeatedly.
    pub fn stop(&self) {
        self.shutdown.trigger();
        if let Some(task) = self.task.lock().expect("monitor task mutex poisoned").take() {
            // The loop exits on the shutdown signal; dropping the handle
            // just detaches it.
            drop(task);
        }
    }

    /// Record one gated request outcome. Called from outside the loop.
    pub fn record_request(&self, success: bool, latency_ms: u64) {
        self.ctx.counters.record_request(success, latency_ms);
        if self.config.enable_metrics {
            metrics::record_request(success, latency_ms);
        }
    }

    /// Record one ensemble (chain submission) outcome.
    pub fn record_ensemble_operation(&self, success: bool) {
        self.ctx.counters.record_ensemble_operation(success);
        if self.config.enable_metrics {
            metrics::record_ensemble_operation(success);
        }
    }

    /// The most recent aggregation cycle, if any has completed.
    pub fn health_status(&self) -> Option<HealthStatus> {
        self.status.read().expect("monitor status lock poisoned").clone()
    }

    /// Seconds since the monitor was constructed.
    pub fn uptime(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// One full aggregation cycle. Public for deterministic testing.
    pub async fn run_cycle(&self) {
        let budget = probe_budget(self.config.check_interval);
        let mut results = BTreeMap::new();

        for name in checks::battery(&self.ctx) {
            let started = Instant::now();
            let verdict = match tokio::time::timeout(budget, checks::run_check(&self.ctx, name)).await
            {
                Ok(Ok(result)) => result,
                Ok(Err(error)) => {
                    self.emit_check_error(name, &error);
                    CheckResult::fail(format!("check error: {error}"))
                }
                Err(_) => {
                    let error = format!("timed out after {}ms", budget.as_millis());
                    self.emit_check_error(name, &error);
                    CheckResult::fail(error)
                }
            };
            results.insert(name.to_string(), verdict.timed(started.elapsed()));
        }

        let (memory_pct, cpu_pct) = self.ctx.sample_system();
        let counters = &self.ctx.counters;
        let health_metrics = HealthMetrics {
            requests_total: counters.requests_total(),
            error_rate: counters.error_rate(),
            avg_latency_ms: counters.avg_latency_ms(),
            memory_pct,
            cpu_pct,
            ensemble_operations: counters.ensemble_operations(),
            ensemble_consecutive_failures: counters.ensemble_consecutive_failures(),
            ensemble_connected: counters.ensemble_connected(),
        };

        let overall = aggregate(&results);
        let status = HealthStatus {
            overall,
            timestamp: SystemTime::now(),
            uptime_secs: self.uptime(),
            checks: results,
            metrics: health_metrics.clone(),
        };

        let previous_overall = self
            .health_status()
            .map(|previous| previous.overall);

        if self.config.enable_alerting {
            self.evaluate_alerts(&health_metrics, overall, previous_overall);
        }
        if self.config.enable_metrics {
            metrics::record_overall_health(overall);
        }

        *self.status.write().expect("monitor status lock poisoned") = Some(status.clone());

        tracing::debug!(overall = %overall, "Health cycle complete");
        let _ = self.events.send(MonitorEvent::HealthCheck(status));
    }

    fn evaluate_alerts(
        &self,
        health_metrics: &HealthMetrics,
        overall: OverallHealth,
        previous_overall: Option<OverallHealth>,
    ) {
        let thresholds = &self.config.thresholds;

        if health_metrics.error_rate > thresholds.error_rate {
            self.emit_alert(Alert::new(
                "error_rate",
                Severity::High,
                format!(
                    "error rate {:.1}% above threshold",
                    health_metrics.error_rate * 100.0
                ),
                health_metrics.error_rate,
                thresholds.error_rate,
            ));
        }

        if health_metrics.avg_latency_ms > thresholds.response_time_ms {
            self.emit_alert(Alert::new(
                "response_time",
                Severity::Medium,
                format!(
                    "average latency {:.0}ms above threshold",
                    health_metrics.avg_latency_ms
                ),
                health_metrics.avg_latency_ms,
                thresholds.response_time_ms,
            ));
        }

        if health_metrics.memory_pct > thresholds.memory_pct {
            self.emit_alert(Alert::new(
                "memory",
                Severity::Medium,
                format!("memory usage {:.1}% above threshold", health_metrics.memory_pct),
                health_metrics.memory_pct,
                thresholds.memory_pct,
            ));
        }

        if health_metrics.cpu_pct > thresholds.cpu_pct {
            self.emit_alert(Alert::new(
                "cpu",
                Severity::Medium,
                format!("cpu usage {:.1}% above threshold", health_metrics.cpu_pct),
                health_metrics.cpu_pct,
                thresholds.cpu_pct,
            ));
        }

        // Collapsing to unhealthy always escalates, independent of which
        // probe or threshold caused it.
        if overall == OverallHealth::Unhealthy && previous_overall != Some(OverallHealth::Unhealthy)
        {
            self.emit_alert(Alert::new(
                "overall_health",
                Severity::Critical,
                "overall health is unhealthy",
                0.0,
                0.0,
            ));
        }
    }

    fn emit_alert(&self, alert: Alert) {
        tracing::warn!(
            kind = %alert.kind,
            severity = %alert.severity,
            value = alert.value,
            threshold = alert.threshold,
            "{}",
            alert.message
        );
        if self.config.enable_metrics {
            metrics::record_alert(&alert.kind);
        }
        let _ = self.events.send(MonitorEvent::Alert(alert));
    }

    fn emit_check_error(&self, check: &str, error: &str) {
        tracing::warn!(check, error, "Health check error");
        let _ = self.events.send(MonitorEvent::CheckError {
            check: check.to_string(),
            error: error.to_string(),
        });
    }
}

/// Per-probe timeout: half the tick interval, capped at five seconds.
fn probe_budget(check_interval: Duration) -> Duration {
    (check_interval / 2).min(Duration::from_secs(5))
}
