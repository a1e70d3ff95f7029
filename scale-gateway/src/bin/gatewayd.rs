//! Server entry point: load configuration, connect to the store, serve HTTP.
//!
//! Exit code 0 on clean shutdown (Ctrl-C); nonzero on bind failure or the
//! store being unreachable at startup.

use std::net::SocketAddr;
use std::sync::Arc;

use scale_gateway::api::{self, AppState};
use scale_gateway::config::Config;
use scale_gateway::store::postgres::{self, PgStore};
use scale_gateway::store::Store;
use scale_gateway::tracing::{self as gateway_tracing, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    gateway_tracing::init(config.log_level);

    info!(port = config.port, weight_unit = %config.weight_unit, "starting scale-gatewayd");

    let pool = postgres::connect(&config.database_url).await?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    let state = AppState::new(store, config.weight_unit);
    let router = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
