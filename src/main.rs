//! Traffic Light server - binary entry point

use std::sync::Arc;

use tracing::info;

use traffic_light::api::http::create_router;
use traffic_light::api::websocket::state::AppState;
use traffic_light::config::ServerConfig;
use traffic_light::reaper;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env();
    let state = Arc::new(AppState::new());

    tokio::spawn(reaper::run(
        state.clone(),
        config.reap_interval,
        config.inactive_grace,
    ));

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "traffic-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutting down");
}
