//! Identity provider adapter interface.
//!
//! The adapter wraps a third-party federation client (SAML, WS-Federation,
//! LDAP). The bridge never speaks the provider's wire protocol itself; it
//! only asks the adapter whether the browser is authenticated, sends the
//! browser to it, and reads the attributes it releases.
//!
//! Adapters keep their per-browser state in the session's provider notes,
//! so clearing a stale binding also forgets the provider's session.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use ssp_model::FederatedAttributeSet;
use ssp_session::SessionState;

use crate::error::{AuthError, AuthResult};

/// Options for starting a provider login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginOptions {
    /// Where the provider sends the browser once it is done.
    ///
    /// This is the login callback: the request that lands here finishes the
    /// local half of the login.
    pub return_to: String,
    /// Attempt a silent login without user interaction.
    pub passive: bool,
    /// Re-prompt even if the provider session is still valid.
    pub force: bool,
    /// Where to send the browser if a passive login fails.
    pub error_url: Option<String>,
}

impl LoginOptions {
    /// Creates options returning to the given URL.
    #[must_use]
    pub fn new(return_to: impl Into<String>) -> Self {
        Self {
            return_to: return_to.into(),
            ..Self::default()
        }
    }

    /// Requests a passive login.
    #[must_use]
    pub const fn passive(mut self) -> Self {
        self.passive = true;
        self
    }

    /// Requests forced re-authentication.
    #[must_use]
    pub const fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Sets the passive-failure URL.
    #[must_use]
    pub fn with_error_url(mut self, url: impl Into<String>) -> Self {
        self.error_url = Some(url.into());
        self
    }
}

/// Options for starting a provider logout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoutOptions {
    /// Where the provider sends the browser once logout is done.
    pub return_to: String,
}

impl LogoutOptions {
    /// Creates options returning to the given URL.
    #[must_use]
    pub fn new(return_to: impl Into<String>) -> Self {
        Self {
            return_to: return_to.into(),
        }
    }
}

/// What the provider wants the current request to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// The provider session is authenticated; continue locally.
    Authenticated,
    /// Leave the site. The current request ends here and a later request
    /// resumes the flow at the return URL.
    Redirect(String),
}

impl ProviderOutcome {
    /// Checks if the provider session is authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Adapter over an external identity provider, bound to one source.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the authentication source this adapter serves.
    fn source_name(&self) -> &str;

    /// Checks if the browser has a valid federation session.
    async fn is_authenticated(&self, session: &SessionState) -> AuthResult<bool>;

    /// Returns `Authenticated` if the federation session is valid, otherwise
    /// sends the browser to the provider.
    async fn require_auth(
        &self,
        session: &mut SessionState,
        options: &LoginOptions,
    ) -> AuthResult<ProviderOutcome>;

    /// Starts a provider login.
    async fn login(
        &self,
        session: &mut SessionState,
        options: &LoginOptions,
    ) -> AuthResult<ProviderOutcome>;

    /// Starts a provider logout.
    async fn logout(
        &self,
        session: &mut SessionState,
        options: &LogoutOptions,
    ) -> AuthResult<ProviderOutcome>;

    /// Returns the attributes released for the authenticated session.
    async fn attributes(&self, session: &SessionState) -> AuthResult<FederatedAttributeSet>;

    /// Returns the provider's own session identifier, if it has one.
    ///
    /// The local session adopts this id after login, so it must satisfy
    /// [`SessionState::is_valid_id`]. Ids that do not are never adopted.
    fn session_id(&self, session: &SessionState) -> Option<String>;

    /// Finishes provider-side bookkeeping once logout has come back.
    async fn finish_logout(&self, session: &mut SessionState) -> AuthResult<()> {
        session.provider_notes.clear();
        Ok(())
    }

    /// Returns the provider's portal page, if it has one.
    fn portal_url(&self) -> Option<String> {
        None
    }
}

/// Creates identity provider adapters by source name.
pub trait IdentityProviderFactory: Send + Sync {
    /// Returns the adapter for a source.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error if no adapter serves the source.
    fn create(&self, source_name: &str) -> AuthResult<Arc<dyn IdentityProvider>>;
}

/// Factory over a fixed set of adapters.
#[derive(Default)]
pub struct StaticProviderFactory {
    providers: DashMap<String, Arc<dyn IdentityProvider>>,
}

impl StaticProviderFactory {
    /// Creates an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under its source name.
    #[must_use]
    pub fn with(self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Registers an adapter under its source name.
    pub fn register(&self, provider: Arc<dyn IdentityProvider>) {
        self.providers
            .insert(provider.source_name().to_string(), provider);
    }

    /// Lists the registered source names.
    #[must_use]
    pub fn sources(&self) -> Vec<String> {
        self.providers.iter().map(|e| e.key().clone()).collect()
    }
}

impl std::fmt::Debug for StaticProviderFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticProviderFactory")
            .field("sources", &self.sources())
            .finish()
    }
}

impl IdentityProviderFactory for StaticProviderFactory {
    fn create(&self, source_name: &str) -> AuthResult<Arc<dyn IdentityProvider>> {
        self.providers
            .get(source_name)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| {
                AuthError::Configuration(ssp_core::ConfigError::invalid(format!(
                    "no identity provider adapter serves '{source_name}'"
                )))
            })
    }
}
