//! Registry snapshot endpoint handler.
//!
//! Returns the live process view as JSON. The response reflects the most
//! recently completed reconciliation cycle and never blocks on a cycle in
//! progress - records are read concurrently from the registry.

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the /processes endpoint.
#[instrument(skip(state))]
pub async fn processes_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /processes request");

    Json(state.registry.snapshot())
}
