//! Sampling and reconciliation engine.
//!
//! One cycle marks every record provisionally stale, waits the settling
//! interval so a meaningful processor-time delta can accumulate,
//! re-queries the process table, reconciles the snapshot into the
//! registry, evaluates the load thresholds, and finally evicts whatever
//! was not refreshed. The loop never terminates on a cycle error; only
//! the shutdown signal stops it, and it is checked between cycles so an
//! in-flight cycle always completes.

use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::process::{collect_samples, SnapshotError};
use crate::state::{AppState, SharedState};
use crate::threshold::{self, LoadLatches};

/// A whole cycle failed. Per-process read errors never surface here; they
/// are skipped inside the cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("failed to publish alert event: {0}")]
    Publish(#[from] serde_json::Error),
}

/// Drives sampling cycles until the shutdown signal flips.
///
/// Cycle failures are logged and the loop proceeds to the next cycle;
/// latch state survives failed cycles so edge detection stays consistent.
pub async fn run(state: SharedState, shutdown: watch::Receiver<bool>) {
    let mut latches = LoadLatches::default();
    info!(
        "Sampling loop started (settle interval {} ms)",
        state.settle_interval.as_millis()
    );

    while !*shutdown.borrow() {
        if let Err(e) = run_cycle(&state, &mut latches).await {
            state.stats.record_cycle_failure();
            error!("Sampling cycle failed: {}", e);
        }
    }

    info!("Sampling loop stopped");
}

/// Performs one full update cycle against the registry.
pub async fn run_cycle(state: &AppState, latches: &mut LoadLatches) -> Result<(), CycleError> {
    let started = Instant::now();

    state.registry.mark_all_stale();

    // No lock is held here: snapshot queries keep reading the registry
    // while the processor-time delta accumulates.
    tokio::time::sleep(state.settle_interval).await;

    let outcomes = collect_samples(&state.proc_root)?;
    let now = Instant::now();

    let mut sampled = 0usize;
    let mut skipped = 0usize;
    for (pid, outcome) in outcomes {
        match outcome {
            Ok(sample) => {
                state
                    .registry
                    .reconcile(sample, now, state.processor_count);
                sampled += 1;
            }
            Err(e) if e.is_transient() => {
                skipped += 1;
                debug!("Skipping process {}: {}", pid, e);
            }
            Err(e) => {
                skipped += 1;
                warn!("Skipping process {}: {}", pid, e);
            }
        }
    }

    // Thresholds see the fully reconciled registry; eviction runs after,
    // so records on their way out still count toward this cycle's totals.
    let totals = state.registry.load_totals();
    for transition in threshold::evaluate(totals, state.capacity_mb, &state.thresholds, latches) {
        info!(
            "Load transition: {} is_high={} (cpu total {:.2}%, memory total {} MB)",
            crate::alerts::event_name(transition.metric),
            transition.is_high,
            totals.cpu_percent,
            totals.memory_mb
        );
        state.alerts.publish(transition)?;
    }

    let evicted = state.registry.evict_stale();

    state.stats.record_cycle(started.elapsed());
    debug!(
        "Cycle complete: {} sampled, {} skipped, {} evicted, {} live, {:.2}ms",
        sampled,
        skipped,
        evicted,
        state.registry.len(),
        started.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}

/// Seeds the registry with a baseline snapshot before the loop starts, so
/// the HTTP surface has data immediately. No usage is derived and no
/// thresholds are evaluated; every record starts at zero CPU.
pub async fn populate_baseline(state: &AppState) -> Result<usize, CycleError> {
    let outcomes = collect_samples(&state.proc_root)?;
    let now = Instant::now();

    let mut sampled = 0usize;
    for (pid, outcome) in outcomes {
        match outcome {
            Ok(sample) => {
                state
                    .registry
                    .reconcile(sample, now, state.processor_count);
                sampled += 1;
            }
            Err(e) => {
                debug!("Skipping process {} during baseline: {}", pid, e);
            }
        }
    }
    Ok(sampled)
}
