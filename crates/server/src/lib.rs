//! # Leverage Server
//!
//! Axum front end for the two assistant backends. Each binary calls
//! [`start`] with the service it serves.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

use crate::{
    config::{get_config, AppConfig, Service},
    router::create_router,
    state::build_app_state,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::FmtSubscriber;

/// Builds the state for `service` and serves it on `listener`.
pub async fn run(listener: TcpListener, config: AppConfig, service: Service) -> anyhow::Result<()> {
    debug!(?service, "Server configuration loaded");

    let app_state = build_app_state(config, service).await?;
    let app = create_router(app_state);

    info!("{} listening on {}", service.name(), listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// The binaries' entry point.
///
/// Sets up logging, configuration and the TCP listener, then calls `run`.
pub async fn start(service: Service) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = get_config(None)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port_for(service)));
    let listener = TcpListener::bind(addr).await?;

    run(listener, config, service).await
}
