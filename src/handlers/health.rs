//! Health check endpoint handler.
//!
//! Returns sampling-loop statistics as plain text. The endpoint reports
//! 503 until the first cycle has completed, after which the registry is
//! known to reflect a full reconciliation.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let cycles = state.stats.cycles_completed();
    let failures = state.stats.cycle_failures();

    let status = if cycles > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let message = if cycles > 0 {
        "OK"
    } else {
        "Waiting for first sampling cycle"
    };

    let uptime_secs = state.start_time.elapsed().as_secs();
    let uptime_str = format!(
        "{}h {}m {}s",
        uptime_secs / 3600,
        (uptime_secs % 3600) / 60,
        uptime_secs % 60
    );

    let mut out = String::new();
    writeln!(out, "{message}").ok();
    writeln!(out).ok();
    writeln!(out, "Uptime:              {uptime_str}").ok();
    writeln!(out, "Cycles completed:    {cycles}").ok();
    writeln!(out, "Cycle failures:      {failures}").ok();
    writeln!(
        out,
        "Last cycle duration: {} ms",
        state.stats.last_cycle_duration_ms()
    )
    .ok();
    if let Some(age) = state.stats.last_cycle_age() {
        writeln!(out, "Last cycle age:      {:.1} s", age.as_secs_f64()).ok();
    }
    writeln!(out, "Live processes:      {}", state.registry.len()).ok();
    writeln!(out, "Memory capacity:     {} MB", state.capacity_mb).ok();
    writeln!(out, "Logical processors:  {}", state.processor_count).ok();
    writeln!(
        out,
        "Alert subscribers:   {}",
        state.alerts.subscriber_count()
    )
    .ok();

    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        out,
    )
}
