//! Session binding.
//!
//! Remembers which authenticator governs a browser session so later requests
//! reuse the same federation session instead of resolving again.

use std::sync::Arc;

use ssp_core::{AuthEvent, AuthEventType};
use ssp_session::{AuthenticatorBinding, SessionState};

use crate::authenticator::Authenticator;
use crate::error::AuthResult;
use crate::registry::AuthenticatorRegistry;

/// Stores, restores and clears authenticator bindings.
#[derive(Debug, Clone)]
pub struct SessionBinder {
    registry: Arc<AuthenticatorRegistry>,
}

impl SessionBinder {
    /// Creates a binder over a registry.
    #[must_use]
    pub const fn new(registry: Arc<AuthenticatorRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &AuthenticatorRegistry {
        &self.registry
    }

    /// Binds the session to an authenticator.
    pub fn store(&self, session: &mut SessionState, authenticator: &Authenticator) {
        session.bind(authenticator.binding());
    }

    /// Restores the bound authenticator if its federation session is still valid.
    ///
    /// A binding that names something the registry can no longer build, or
    /// whose federation session has expired, is cleared and `None` returned.
    ///
    /// ## Errors
    ///
    /// Provider failures while checking the federation session propagate.
    pub async fn load(&self, session: &mut SessionState) -> AuthResult<Option<Authenticator>> {
        let Some(binding) = session.binding.clone() else {
            return Ok(None);
        };

        let authenticator = match self.registry.restore(&binding) {
            Ok(authenticator) => authenticator,
            Err(err) if err.is_configuration() => {
                tracing::warn!(
                    source = %binding.source_name,
                    implementation = %binding.implementation_id,
                    error = %err,
                    "Discarding binding that no longer resolves"
                );
                self.clear(session);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        if authenticator.is_authenticated(session).await? {
            return Ok(Some(authenticator));
        }

        tracing::info!(source = %binding.source_name, session_id = %session.id, "Federation session expired");
        AuthEvent::builder(AuthEventType::BindingExpired)
            .source(&binding.source_name)
            .session(&session.id)
            .emit();
        self.clear(session);
        Ok(None)
    }

    /// Restores the bound authenticator without checking the federation
    /// session. Used once the provider has already logged the user out.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error if the binding no longer resolves.
    pub fn restore(&self, session: &SessionState) -> AuthResult<Option<Authenticator>> {
        session
            .binding
            .as_ref()
            .map(|binding| self.registry.restore(binding))
            .transpose()
    }

    /// Returns the bound authenticator if still valid, otherwise resolves
    /// one afresh.
    ///
    /// ## Errors
    ///
    /// Any error from [`SessionBinder::load`] or
    /// [`AuthenticatorRegistry::resolve_authenticator`].
    pub async fn current(
        &self,
        session: &mut SessionState,
        source_override: Option<&str>,
    ) -> AuthResult<Authenticator> {
        if let Some(authenticator) = self.load(session).await? {
            return Ok(authenticator);
        }
        self.registry.resolve_authenticator(source_override)
    }

    /// Clears the binding and the provider's notes.
    pub fn clear(&self, session: &mut SessionState) -> Option<AuthenticatorBinding> {
        session.clear_binding()
    }
}
