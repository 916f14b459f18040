//! Live process registry and usage derivation.
//!
//! The registry is the authoritative in-memory view of the process table:
//! one record per PID observed live in the most recently completed cycle.
//! The sampling loop is its only writer; HTTP handlers read it
//! concurrently. Updates replace the whole record in the map rather than
//! mutating fields in place, so a concurrent reader never sees a mix of
//! old and new derived values for the same record.

use dashmap::DashMap;
use serde::Serialize;
use std::time::Instant;

use crate::process::ProcessSample;
use crate::system::MB_DIVIDER;
use crate::threshold::LoadTotals;

/// One entry per observed process identifier.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pub pid: u32,
    /// Display name, refreshed from each sample; a replaced process under
    /// a reused PID picks up the new name.
    pub name: String,
    /// Resident set normalized to MB, updated every cycle.
    pub memory_mb: u64,
    /// Derived usage percentage, >= 0, rounded to two decimals. Zero until
    /// a second sample exists - the first observation has no valid delta.
    pub cpu_percent: f64,
    /// Cumulative processor time at `sampled_at`. Delta input only, never
    /// serialized.
    pub prev_cpu_time_ms: f64,
    /// Reference point for the next cycle's time delta.
    pub sampled_at: Instant,
    /// Per-cycle liveness flag: cleared at cycle start, set when refreshed,
    /// evicted at cycle end if still clear.
    pub live: bool,
}

/// Read-only projection served by the HTTP snapshot endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessView {
    pub id: u32,
    pub name: String,
    pub memory_usage: u64,
    pub cpu_usage: f64,
}

impl From<&ProcessRecord> for ProcessView {
    fn from(record: &ProcessRecord) -> Self {
        Self {
            id: record.pid,
            name: record.name.clone(),
            memory_usage: record.memory_mb,
            cpu_usage: record.cpu_percent,
        }
    }
}

/// Derives a CPU usage percentage from a processor-time delta.
///
/// Normalizes raw cumulative consumption (which can exceed 100% of one
/// core) into a percentage of total processing capacity. A non-positive
/// time delta (clock anomaly) or negative CPU delta (PID reused by a new
/// process) clamps to zero rather than dividing or going negative.
pub fn derive_cpu_percent(cpu_delta_ms: f64, time_delta_ms: f64, processor_count: f64) -> f64 {
    if time_delta_ms <= 0.0 || processor_count <= 0.0 {
        return 0.0;
    }
    let percent = cpu_delta_ms / time_delta_ms / processor_count * 100.0;
    round2(percent.max(0.0))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Concurrent map of live process records, keyed by PID.
#[derive(Default)]
pub struct ProcessRegistry {
    records: DashMap<u32, ProcessRecord>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Clears every record's liveness flag at the start of a cycle.
    pub fn mark_all_stale(&self) {
        for mut entry in self.records.iter_mut() {
            entry.live = false;
        }
    }

    /// Merges one sample into the registry.
    ///
    /// A known PID gets a fresh record with derived CPU usage computed from
    /// the stored delta inputs; an unknown PID gets a baseline record with
    /// zero usage. Either way the map entry is replaced atomically.
    pub fn reconcile(&self, sample: ProcessSample, now: Instant, processor_count: f64) {
        let previous = self
            .records
            .get(&sample.pid)
            .map(|r| (r.prev_cpu_time_ms, r.sampled_at));

        let cpu_percent = match previous {
            Some((prev_cpu_time_ms, prev_sampled_at)) => {
                let time_delta_ms = now.duration_since(prev_sampled_at).as_secs_f64() * 1000.0;
                let cpu_delta_ms = sample.cpu_time_ms - prev_cpu_time_ms;
                derive_cpu_percent(cpu_delta_ms, time_delta_ms, processor_count)
            }
            None => 0.0,
        };

        self.records.insert(
            sample.pid,
            ProcessRecord {
                pid: sample.pid,
                name: sample.name,
                memory_mb: sample.memory_bytes / MB_DIVIDER,
                cpu_percent,
                prev_cpu_time_ms: sample.cpu_time_ms,
                sampled_at: now,
                live: true,
            },
        );
    }

    /// Removes every record not refreshed this cycle. Returns the number
    /// of evicted records.
    pub fn evict_stale(&self) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.live);
        before - self.records.len()
    }

    /// Sums usage across all records for threshold evaluation.
    pub fn load_totals(&self) -> LoadTotals {
        let mut totals = LoadTotals::default();
        for record in self.records.iter() {
            totals.cpu_percent += record.cpu_percent;
            totals.memory_mb += record.memory_mb;
        }
        totals
    }

    /// Returns the current view of all records, ordered by descending CPU
    /// usage. Safe to call while a cycle is in progress.
    pub fn snapshot(&self) -> Vec<ProcessView> {
        let mut views: Vec<ProcessView> = self
            .records
            .iter()
            .map(|record| ProcessView::from(record.value()))
            .collect();
        views.sort_by(|a, b| {
            b.cpu_usage
                .partial_cmp(&a.cpu_usage)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        views
    }

    /// Clone of a single record, mainly for tests and diagnostics.
    pub fn get(&self, pid: u32) -> Option<ProcessRecord> {
        self.records.get(&pid).map(|r| r.clone())
    }
}
