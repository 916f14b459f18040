//! Snapshot source: reading the running-process table from /proc.
//!
//! This module provides:
//! - `snapshot`: process enumeration and per-process sampling
//! - `cpu`: cumulative processor-time parsing
//! - `memory`: resident-set parsing

pub mod cpu;
pub mod memory;
pub mod snapshot;

// Re-export commonly used types
pub use cpu::{parse_cpu_time_ms, CLK_TCK};
pub use memory::read_resident_bytes;
pub use snapshot::{
    collect_samples, read_process_name, sample_process, ProcessSample, SampleError, SnapshotError,
};
