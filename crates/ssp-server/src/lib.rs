//! # ssp-server
//!
//! Axum server for the SSP bridge.
//!
//! This crate exposes the bridge's auth actions over HTTP:
//! - `/Security/login`, `/Security/logout` and `/Security/loggedout`
//! - `/Security/LoginForm`, `/Security` and `/Security/ping`
//! - an optional passive-login layer for host pages
//!
//! ## Architecture
//!
//! The HTTP layer owns the session lifecycle: it loads the session named by
//! the request cookie, hands it to one [`AuthController`] action and writes
//! it back once. Everything else lives in `ssp-auth`.
//!
//! ## Usage
//!
//! ```ignore
//! use ssp_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config).await?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod controller;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use controller::{ActionParams, ActionResponse, AuthController, RequestContext};
pub use error::{ServerError, ServerResult};
pub use router::{create_router, security_router, with_passive_login};
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use ssp_auth::{
    AuthenticatorRegistry, IdentityProviderFactory, InMemoryIdentityProvider, StaticProviderFactory,
};
use ssp_core::BridgeConfig;
use ssp_session::{InMemorySessionStore, SessionStore};
use ssp_storage::{InMemoryUserProvider, UserProvider};
use ssp_storage_sql::{PgUserProvider, PoolConfig};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// The SSP bridge server.
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Creates a server from environment-derived configuration.
    ///
    /// Loads the bridge configuration, connects user storage and checks that
    /// every configured source can be served.
    ///
    /// # Errors
    ///
    /// Returns an error if the bridge configuration cannot be loaded or is
    /// unusable, or if the database cannot be reached.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let bridge = BridgeConfig::load(&config.bridge_config_path).with_context(|| {
            format!(
                "loading bridge configuration from {}",
                config.bridge_config_path.display()
            )
        })?;
        let providers = dev_providers(&bridge)?;
        let users = connect_users(&config).await?;
        let sessions = Arc::new(InMemorySessionStore::with_timeouts(config.session_timeouts()));
        Self::from_parts(config, bridge, Arc::new(providers), users, sessions)
    }

    /// Creates a server from already-built parts.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured source cannot be instantiated.
    pub fn from_parts(
        config: ServerConfig,
        bridge: BridgeConfig,
        providers: Arc<dyn IdentityProviderFactory>,
        users: Arc<dyn UserProvider>,
        sessions: Arc<dyn SessionStore>,
    ) -> anyhow::Result<Self> {
        let registry =
            AuthenticatorRegistry::new(Arc::new(bridge), config.environment, providers, users);
        registry.validate()?;

        let state = AppState::new(config.clone(), Arc::new(registry), sessions);
        Ok(Self { config, state })
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn run(self) -> anyhow::Result<()> {
        let sweeper = spawn_session_sweeper(
            Arc::clone(&self.state.sessions),
            Duration::from_secs(self.config.session_sweep_interval_secs.max(1)),
        );
        let app = create_router(self.state);

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        sweeper.abort();
        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the application state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Creates a router without starting the server.
    ///
    /// This is useful for integration testing.
    pub fn test_router(&self) -> Router {
        create_router(self.state.clone())
    }
}

/// Builds the development identity provider for every configured source.
///
/// # Errors
///
/// Returns an error if the configuration has no `[dev_provider]` table.
pub fn dev_providers(bridge: &BridgeConfig) -> anyhow::Result<StaticProviderFactory> {
    let dev = bridge.dev_provider.as_ref().ok_or_else(|| {
        anyhow::anyhow!("no identity provider adapter configured; add a [dev_provider] table")
    })?;

    tracing::warn!("Using the in-process development identity provider");
    Ok(bridge
        .authenticators
        .iter()
        .fold(StaticProviderFactory::new(), |providers, descriptor| {
            providers.with(Arc::new(InMemoryIdentityProvider::from_config(
                descriptor.source.as_str(),
                dev,
            )))
        }))
}

/// Removes expired sessions every `period` until the task is aborted.
pub fn spawn_session_sweeper(sessions: Arc<dyn SessionStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match sessions.remove_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Swept expired sessions"),
                Err(err) => tracing::warn!(error = %err, "Session sweep failed"),
            }
        }
    })
}

async fn connect_users(config: &ServerConfig) -> anyhow::Result<Arc<dyn UserProvider>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, local users are kept in memory");
        return Ok(Arc::new(InMemoryUserProvider::new()));
    };

    let pool_config = PoolConfig::new(database_url)
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections);
    let pool = ssp_storage_sql::create_pool(&pool_config).await?;
    ssp_storage_sql::run_migrations(&pool).await?;

    tracing::info!("Database connection pool created");
    Ok(Arc::new(PgUserProvider::new(pool)))
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
