use tracing::info;

use pulse_access::config::AccessConfig;
use pulse_access::router::build_router;
use pulse_access::state::AppState;
use pulse_core::config::Config;
use pulse_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = AccessConfig::from_env();
    let state = AppState::from_config(&config).expect("failed to build application state");

    // Codes must be provisioned before the service can issue anything.
    match state.ledger.snapshot().await {
        Ok(ledger) => info!(
            codes = ledger.codes().len(),
            unissued = ledger.unissued_count(),
            "ledger loaded"
        ),
        Err(e) => panic!("ledger unavailable: {e}"),
    }

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.access_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("access service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
