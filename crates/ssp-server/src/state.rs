//! Application state.
//!
//! Shared by every request handler and the passive-login middleware.

use std::sync::Arc;

use ssp_auth::{AuthenticatorRegistry, SessionBinder};
use ssp_core::BridgeConfig;
use ssp_session::SessionStore;

use crate::config::ServerConfig;
use crate::controller::AuthController;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,

    /// Auth actions.
    pub controller: Arc<AuthController>,

    /// Session records, keyed by the id in the session cookie.
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    /// Creates the application state.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        registry: Arc<AuthenticatorRegistry>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            controller: Arc::new(AuthController::new(SessionBinder::new(registry))),
            sessions,
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the bridge configuration.
    #[must_use]
    pub fn bridge(&self) -> &BridgeConfig {
        self.controller.binder().registry().config()
    }

    /// Returns the authenticator registry.
    #[must_use]
    pub fn registry(&self) -> &AuthenticatorRegistry {
        self.controller.binder().registry()
    }
}
