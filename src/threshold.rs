//! Aggregate load evaluation with hysteresis latching.
//!
//! After each reconciliation cycle the sampler sums usage across the
//! registry and feeds the totals through `evaluate`. Each metric carries
//! an independent latch that flips only when its threshold is crossed, so
//! a sustained overload produces exactly one rising event and one falling
//! event - never a stream of repeats.

/// Which aggregate metric a transition refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMetric {
    Cpu,
    Memory,
}

/// One latch flip: the metric and the new latch value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTransition {
    pub metric: LoadMetric,
    pub is_high: bool,
}

/// Latch state surviving across cycles. Owned by the sampling loop and
/// passed in mutably; `evaluate` never touches anything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadLatches {
    pub cpu_high: bool,
    pub memory_high: bool,
}

/// Registry-wide usage sums produced by `ProcessRegistry::load_totals`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadTotals {
    pub cpu_percent: f64,
    pub memory_mb: u64,
}

/// Alert trip points, resolved from configuration at startup.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Aggregate CPU percentage above which the CPU latch sets.
    pub cpu_percent: f64,
    /// Fraction of total memory above which the memory latch sets.
    pub memory_fraction: f64,
}

/// Evaluates both load rules against the current totals.
///
/// Returns zero, one, or two transitions - one per metric whose latch
/// flipped this cycle. A capacity of zero disables the memory rule (the
/// fraction evaluates to zero) instead of dividing by zero.
pub fn evaluate(
    totals: LoadTotals,
    capacity_mb: u64,
    thresholds: &Thresholds,
    latches: &mut LoadLatches,
) -> Vec<LoadTransition> {
    let mut transitions = Vec::new();

    let cpu_over = totals.cpu_percent > thresholds.cpu_percent;
    if cpu_over != latches.cpu_high {
        latches.cpu_high = cpu_over;
        transitions.push(LoadTransition {
            metric: LoadMetric::Cpu,
            is_high: cpu_over,
        });
    }

    let memory_fraction = if capacity_mb == 0 {
        0.0
    } else {
        totals.memory_mb as f64 / capacity_mb as f64
    };
    let memory_over = memory_fraction > thresholds.memory_fraction;
    if memory_over != latches.memory_high {
        latches.memory_high = memory_over;
        transitions.push(LoadTransition {
            metric: LoadMetric::Memory,
            is_high: memory_over,
        });
    }

    transitions
}
