//! Authenticator registry and resolution.
//!
//! The registry decides which source governs a request and builds the
//! [`Authenticator`] for it. Resolution is pure: the same configuration,
//! environment and override always yield the same source.
//!
//! ## Resolution order
//!
//! 1. An explicit source named by the request
//! 2. The configured default (fixed, or per environment)
//! 3. The first declared source

use std::collections::HashMap;
use std::sync::Arc;

use ssp_core::{BridgeConfig, ConfigError, EnvironmentType};
use ssp_session::AuthenticatorBinding;
use ssp_storage::UserProvider;

use crate::authenticator::Authenticator;
use crate::error::AuthResult;
use crate::hooks::{AuthHooks, NoopHooks};
use crate::profile::{self, ClaimsMapper};
use crate::provider::IdentityProviderFactory;

/// A resolved source and the implementation that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Source name.
    pub source_name: String,
    /// Implementation identifier.
    pub implementation_id: String,
}

/// Resolves and instantiates authenticators.
pub struct AuthenticatorRegistry {
    config: Arc<BridgeConfig>,
    environment: EnvironmentType,
    implementations: HashMap<String, ClaimsMapper>,
    providers: Arc<dyn IdentityProviderFactory>,
    users: Arc<dyn UserProvider>,
    hooks: Arc<dyn AuthHooks>,
}

impl std::fmt::Debug for AuthenticatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut implementations: Vec<_> = self.implementations.keys().collect();
        implementations.sort();
        f.debug_struct("AuthenticatorRegistry")
            .field("environment", &self.environment)
            .field("sources", &self.config.authenticators)
            .field("implementations", &implementations)
            .finish_non_exhaustive()
    }
}

impl AuthenticatorRegistry {
    /// Creates a registry with the built-in `claims` and `directory`
    /// implementations.
    #[must_use]
    pub fn new(
        config: Arc<BridgeConfig>,
        environment: EnvironmentType,
        providers: Arc<dyn IdentityProviderFactory>,
        users: Arc<dyn UserProvider>,
    ) -> Self {
        Self {
            config,
            environment,
            implementations: profile::builtin()
                .into_iter()
                .map(|(id, mapper)| (id.to_string(), mapper))
                .collect(),
            providers,
            users,
            hooks: Arc::new(NoopHooks),
        }
    }

    /// Registers an additional implementation.
    #[must_use]
    pub fn with_implementation(mut self, id: impl Into<String>, mapper: ClaimsMapper) -> Self {
        self.implementations.insert(id.into(), mapper);
        self
    }

    /// Sets the login/logout hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn AuthHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the runtime environment.
    #[must_use]
    pub const fn environment(&self) -> EnvironmentType {
        self.environment
    }

    /// Returns the hooks.
    #[must_use]
    pub fn hooks(&self) -> &Arc<dyn AuthHooks> {
        &self.hooks
    }

    /// Checks that every configured source can be instantiated.
    ///
    /// Run this at startup so misconfiguration fails before any request.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error naming the first unusable source.
    pub fn validate(&self) -> AuthResult<()> {
        self.config.validate()?;
        for descriptor in &self.config.authenticators {
            self.instantiate(&descriptor.source, &descriptor.implementation)?;
        }
        tracing::debug!(
            environment = %self.environment,
            sources = self.config.authenticators.len(),
            "Authenticator registry validated"
        );
        Ok(())
    }

    /// Resolves the source for a request.
    ///
    /// An empty override counts as none.
    ///
    /// ## Errors
    ///
    /// - `ConfigError::NoAuthenticators` if nothing is configured
    /// - `ConfigError::UnknownSource` if the chosen name is not declared
    /// - `ConfigError::UnknownImplementation` if its implementation is not registered
    pub fn resolve(&self, source_override: Option<&str>) -> AuthResult<Resolution> {
        let source_name = source_override
            .filter(|s| !s.is_empty())
            .or_else(|| self.config.default_source(self.environment))
            .or_else(|| self.config.first_source())
            .ok_or(ConfigError::NoAuthenticators)?;

        let descriptor = self
            .config
            .descriptor(source_name)
            .ok_or_else(|| ConfigError::unknown_source(source_name))?;

        if !self.implementations.contains_key(&descriptor.implementation) {
            return Err(ConfigError::UnknownImplementation {
                source_name: descriptor.source.clone(),
                implementation: descriptor.implementation.clone(),
            }
            .into());
        }

        Ok(Resolution {
            source_name: descriptor.source.clone(),
            implementation_id: descriptor.implementation.clone(),
        })
    }

    /// Builds the authenticator for a source and implementation.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error if the implementation is not
    /// registered or no identity provider adapter serves the source.
    pub fn instantiate(&self, source_name: &str, implementation_id: &str) -> AuthResult<Authenticator> {
        let mapper = *self.implementations.get(implementation_id).ok_or_else(|| {
            ConfigError::UnknownImplementation {
                source_name: source_name.to_string(),
                implementation: implementation_id.to_string(),
            }
        })?;
        let provider = self.providers.create(source_name)?;

        Ok(Authenticator::new(
            source_name,
            implementation_id,
            mapper,
            provider,
            Arc::clone(&self.users),
            Arc::clone(&self.hooks),
        ))
    }

    /// Rebuilds the authenticator recorded in a session binding.
    ///
    /// The configuration is not consulted, so a binding keeps working
    /// even if the request now asks for another source.
    ///
    /// ## Errors
    ///
    /// Same as [`AuthenticatorRegistry::instantiate`].
    pub fn restore(&self, binding: &AuthenticatorBinding) -> AuthResult<Authenticator> {
        self.instantiate(&binding.source_name, &binding.implementation_id)
    }

    /// Resolves the source for a request and builds its authenticator.
    ///
    /// ## Errors
    ///
    /// Any error from [`AuthenticatorRegistry::resolve`] or
    /// [`AuthenticatorRegistry::instantiate`].
    pub fn resolve_authenticator(&self, source_override: Option<&str>) -> AuthResult<Authenticator> {
        let resolution = self.resolve(source_override)?;
        tracing::debug!(
            source = %resolution.source_name,
            implementation = %resolution.implementation_id,
            "Resolved authenticator"
        );
        self.instantiate(&resolution.source_name, &resolution.implementation_id)
    }
}
