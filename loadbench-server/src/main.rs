//! loadbench-server — Axum HTTP control plane for the load-test
//! ingestion, metrics and job orchestration service (Component H).

mod analyze;
mod config;
mod dto;
mod error;
mod health;
mod jobs;
mod metrics_routes;
mod nats_publisher;
mod report;
mod state;
mod upload;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::ServerConfig;
use nats_publisher::NatsPublisher;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig::from_env()?;

    let pool = loadbench_store::connect(&config.database_url, 5).await?;
    loadbench_store::migrate(&pool).await?;
    info!("connected to database and applied migrations");

    let nats = NatsPublisher::connect(&config.nats_url).await?;
    info!("connected to NATS at {}", config.nats_url);

    tokio::fs::create_dir_all(&config.uploads_dir).await?;
    tokio::fs::create_dir_all(&config.reports_dir).await?;

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState { pool, nats, config });

    let app = Router::new()
        .merge(upload::router(state.clone()))
        .merge(analyze::router(state.clone()))
        .merge(jobs::router(state.clone()))
        .merge(report::router(state.clone()))
        .merge(health::router(state.clone()))
        .merge(metrics_routes::router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    info!("loadbench-server listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
