use axum::{extract::State, http::StatusCode};
use tracing::warn;

use crate::state::AppState;

/// Handler for `GET /readyz`: ready once the code table loads cleanly.
pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    match state.ledger.snapshot().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "ledger not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
