//! Application state management.
//!
//! This module defines the shared application state that is passed to HTTP
//! handlers and owned by the background sampling task.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock as StdRwLock};
use std::time::{Duration, Instant};

use crate::alerts::AlertBus;
use crate::config::{
    Config, DEFAULT_ALERT_BUFFER, DEFAULT_CPU_THRESHOLD_PERCENT,
    DEFAULT_MEMORY_THRESHOLD_FRACTION, DEFAULT_PROC_ROOT, DEFAULT_SETTLE_INTERVAL_MS,
};
use crate::registry::ProcessRegistry;
use crate::threshold::Thresholds;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Counters describing the sampling loop, served by /health.
#[derive(Default)]
pub struct SamplerStats {
    cycles_completed: AtomicU64,
    cycle_failures: AtomicU64,
    last_cycle_duration_ms: AtomicU64,
    last_cycle_finished: StdRwLock<Option<Instant>>,
}

impl SamplerStats {
    pub fn record_cycle(&self, duration: Duration) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        self.last_cycle_duration_ms
            .store(duration.as_millis() as u64, Ordering::Relaxed);
        *self
            .last_cycle_finished
            .write()
            .expect("stats lock poisoned") = Some(Instant::now());
    }

    pub fn record_cycle_failure(&self) {
        self.cycle_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    pub fn cycle_failures(&self) -> u64 {
        self.cycle_failures.load(Ordering::Relaxed)
    }

    pub fn last_cycle_duration_ms(&self) -> u64 {
        self.last_cycle_duration_ms.load(Ordering::Relaxed)
    }

    /// Seconds since the last completed cycle, if any.
    pub fn last_cycle_age(&self) -> Option<Duration> {
        self.last_cycle_finished
            .read()
            .expect("stats lock poisoned")
            .map(|at| at.elapsed())
    }
}

/// Global application state shared across requests and the sampling task.
pub struct AppState {
    pub registry: ProcessRegistry,
    pub alerts: AlertBus,
    pub stats: SamplerStats,
    pub config: Arc<Config>,
    /// Trip points resolved from configuration at startup.
    pub thresholds: Thresholds,
    /// Pause between the two processor-time readings of a cycle.
    pub settle_interval: Duration,
    /// Proc filesystem root to enumerate.
    pub proc_root: PathBuf,
    /// Total memory capacity in MB, captured once at startup.
    pub capacity_mb: u64,
    /// Online logical processors, captured once at startup.
    pub processor_count: f64,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config, capacity_mb: u64, processor_count: f64) -> Self {
        let thresholds = Thresholds {
            cpu_percent: config
                .cpu_threshold_percent
                .unwrap_or(DEFAULT_CPU_THRESHOLD_PERCENT),
            memory_fraction: config
                .memory_threshold_fraction
                .unwrap_or(DEFAULT_MEMORY_THRESHOLD_FRACTION),
        };
        let settle_interval = Duration::from_millis(
            config
                .settle_interval_ms
                .unwrap_or(DEFAULT_SETTLE_INTERVAL_MS),
        );
        let proc_root = config
            .proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT));
        let alert_buffer = config.alert_buffer.unwrap_or(DEFAULT_ALERT_BUFFER);

        Self {
            registry: ProcessRegistry::new(),
            alerts: AlertBus::new(alert_buffer),
            stats: SamplerStats::default(),
            config: Arc::new(config),
            thresholds,
            settle_interval,
            proc_root,
            capacity_mb,
            processor_count,
            start_time: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_resolves_config_values() {
        let config = Config {
            settle_interval_ms: Some(250),
            cpu_threshold_percent: Some(60.0),
            memory_threshold_fraction: Some(0.5),
            proc_root: Some(PathBuf::from("/tmp/fakeproc")),
            ..Config::default()
        };

        let state = AppState::new(config, 4096, 8.0);
        assert_eq!(state.settle_interval, Duration::from_millis(250));
        assert_eq!(state.thresholds.cpu_percent, 60.0);
        assert_eq!(state.thresholds.memory_fraction, 0.5);
        assert_eq!(state.proc_root, PathBuf::from("/tmp/fakeproc"));
        assert_eq!(state.capacity_mb, 4096);
    }

    #[test]
    fn test_stats_counters() {
        let stats = SamplerStats::default();
        assert_eq!(stats.cycles_completed(), 0);
        assert!(stats.last_cycle_age().is_none());

        stats.record_cycle(Duration::from_millis(42));
        stats.record_cycle_failure();

        assert_eq!(stats.cycles_completed(), 1);
        assert_eq!(stats.cycle_failures(), 1);
        assert_eq!(stats.last_cycle_duration_ms(), 42);
        assert!(stats.last_cycle_age().is_some());
    }
}
