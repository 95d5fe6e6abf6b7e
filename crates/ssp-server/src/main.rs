//! # SSP bridge server
//!
//! Main entry point for the SSP bridge server.

#![forbid(unsafe_code)]
#![deny(warnings)]

use ssp_server::{Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        environment = %config.environment,
        config = %config.bridge_config_path.display(),
        "SSP bridge starting"
    );

    Server::new(config).await?.run().await
}
