//! HTTP endpoint handlers.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/processes`: live registry snapshot, ordered by descending CPU usage
//! - `/alerts/ws`: WebSocket push channel for high-load alert events
//! - `/health`: sampling-loop health statistics
//! - `/`: landing page

pub mod alerts;
pub mod health;
pub mod processes;
pub mod root;

// Re-export handlers
pub use alerts::alerts_ws_handler;
pub use health::health_handler;
pub use processes::processes_handler;
pub use root::root_handler;
