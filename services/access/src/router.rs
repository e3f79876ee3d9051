use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use pulse_core::health::healthz;
use pulse_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    access_code::{request_code, validate_code},
    ballot::submit_ballot,
    health::readyz,
    results::get_results,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Access codes
        .route("/access/code", post(request_code))
        .route("/access/validate", post(validate_code))
        // Ballots
        .route("/ballots", post(submit_ballot))
        .route("/results", get(get_results))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
