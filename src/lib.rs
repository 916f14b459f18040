//! procwatch library
//!
//! This library contains the sampling core of the procwatch daemon: the
//! live process registry, the reconciliation loop that keeps it current,
//! the CPU/memory usage derivation, and the threshold evaluator that
//! raises edge-triggered high-load alerts.
//!
//! The binary in `main.rs` wires these pieces to an axum HTTP server that
//! exposes the registry snapshot and a WebSocket alert channel.
//!
//! # Overview
//!
//! ```text
//! /proc ──> process::collect_samples ──> ProcessRegistry (DashMap)
//!                                              │
//!                sampler::run_cycle ───────────┤
//!                                              ▼
//!                threshold::evaluate ──> AlertBus ──> /alerts/ws
//! ```
//!
//! The sampling loop is the single writer of the registry; HTTP handlers
//! read it concurrently. Records are replaced wholesale on update so a
//! reader never observes a half-updated record.

pub mod alerts;
pub mod cli;
pub mod config;
pub mod handlers;
pub mod process;
pub mod registry;
pub mod sampler;
pub mod state;
pub mod system;
pub mod threshold;

// Re-export the types most callers need
pub use alerts::AlertBus;
pub use config::Config;
pub use registry::{ProcessRecord, ProcessRegistry, ProcessView};
pub use state::{AppState, SharedState};
pub use threshold::{LoadLatches, LoadMetric, LoadTotals, LoadTransition};
