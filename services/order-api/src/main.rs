use common::config::AppConfig;
use common::telemetry::{init_telemetry, TelemetryConfig};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;

mod error;
mod handlers;
mod identity;
mod routes;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    init_telemetry(TelemetryConfig {
        service_name: "order-api".to_string(),
        log_level: config.log_level.clone(),
        json_output: true,
    });

    tracing::info!("Starting order service...");

    let (state, consumer, subscription) = state::AppState::build(&config).await?;

    // The status consumer runs alongside the API on the same service layer;
    // both converge on the store under optimistic concurrency.
    tokio::spawn(consumer.run(subscription));

    let app = routes::build_router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("order-api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        e
    })?;

    Ok(())
}
