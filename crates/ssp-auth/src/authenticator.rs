//! Per-source authenticator.
//!
//! An [`Authenticator`] is bound to exactly one authentication source. It
//! delegates the federation handshake to that source's identity provider
//! adapter and reconciles the released attributes onto a local user.

use std::fmt;
use std::sync::Arc;

use ssp_core::{AuthEvent, AuthEventType};
use ssp_model::{FederatedAttributeSet, LocalUser};
use ssp_session::{AuthenticatorBinding, SessionState};
use ssp_storage::UserProvider;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::hooks::AuthHooks;
use crate::profile::{ClaimsMapper, UserClaims};
use crate::provider::{IdentityProvider, LoginOptions, LogoutOptions, ProviderOutcome};

/// Authenticator for one source.
///
/// Holds no state of its own beyond its binding; everything live belongs to
/// the identity provider adapter, so an authenticator restored from an
/// [`AuthenticatorBinding`] behaves exactly like the one that wrote it.
#[derive(Clone)]
pub struct Authenticator {
    source_name: String,
    implementation_id: String,
    mapper: ClaimsMapper,
    provider: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserProvider>,
    hooks: Arc<dyn AuthHooks>,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("source_name", &self.source_name)
            .field("implementation_id", &self.implementation_id)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Creates an authenticator bound to a source.
    #[must_use]
    pub fn new(
        source_name: impl Into<String>,
        implementation_id: impl Into<String>,
        mapper: ClaimsMapper,
        provider: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserProvider>,
        hooks: Arc<dyn AuthHooks>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            implementation_id: implementation_id.into(),
            mapper,
            provider,
            users,
            hooks,
        }
    }

    /// Returns the source this authenticator is bound to.
    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Returns the implementation identifier.
    #[must_use]
    pub fn implementation_id(&self) -> &str {
        &self.implementation_id
    }

    /// Returns the binding that restores this authenticator.
    #[must_use]
    pub fn binding(&self) -> AuthenticatorBinding {
        AuthenticatorBinding::new(&self.source_name, &self.implementation_id)
    }

    /// Returns the identity provider adapter.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    // === Provider delegation ===

    /// Checks if the federation session is valid.
    pub async fn is_authenticated(&self, session: &SessionState) -> AuthResult<bool> {
        self.provider.is_authenticated(session).await
    }

    /// Requires an authenticated federation session, redirecting to the
    /// provider if there is none.
    ///
    /// The return URL in `options` is the login callback: once it yields
    /// [`ProviderOutcome::Authenticated`] the caller finishes with
    /// [`Authenticator::authenticate`] and [`Authenticator::login_complete`].
    pub async fn require_auth(
        &self,
        session: &mut SessionState,
        options: &LoginOptions,
    ) -> AuthResult<ProviderOutcome> {
        self.provider.require_auth(session, options).await
    }

    /// Starts a provider login (passive or forced per `options`).
    pub async fn login(
        &self,
        session: &mut SessionState,
        options: &LoginOptions,
    ) -> AuthResult<ProviderOutcome> {
        self.provider.login(session, options).await
    }

    /// Starts a provider logout.
    pub async fn logout(
        &self,
        session: &mut SessionState,
        options: &LogoutOptions,
    ) -> AuthResult<ProviderOutcome> {
        self.provider.logout(session, options).await
    }

    /// Returns the attributes released by the provider.
    pub async fn attributes(&self, session: &SessionState) -> AuthResult<FederatedAttributeSet> {
        self.provider.attributes(session).await
    }

    /// Finishes provider-side logout bookkeeping.
    pub async fn finish_logout(&self, session: &mut SessionState) -> AuthResult<()> {
        self.provider.finish_logout(session).await
    }

    // === Local reconciliation ===

    /// Finds or creates the local user for the authenticated provider session.
    ///
    /// Users are matched by email. An existing user is returned unchanged;
    /// a new one is created from the released attributes. Email is always
    /// required, username only when creating.
    ///
    /// ## Errors
    ///
    /// - `AuthError::MissingAttribute` if a required attribute is absent
    /// - `AuthError::ContractViolation` if the result is not a valid local user
    /// - `AuthError::Storage` if user storage fails
    pub async fn authenticate(&self, session: &SessionState) -> AuthResult<LocalUser> {
        let attributes = self.provider.attributes(session).await?;
        let claims = (self.mapper)(&attributes);

        let user = self.find_or_create(claims).await?;
        self.check_contract(&user)?;
        Ok(user)
    }

    async fn find_or_create(&self, claims: UserClaims) -> AuthResult<LocalUser> {
        let email = claims.email.ok_or_else(|| self.missing("email"))?;

        if let Some(existing) = self.users.get_by_email(&email).await? {
            tracing::debug!(source = %self.source_name, user_id = %existing.id, "Matched local user by email");
            return Ok(existing);
        }

        let username = claims.username.ok_or_else(|| self.missing("username"))?;
        let mut user = LocalUser::new(username, &email).with_source(&self.source_name);
        user.first_name = claims.first_name;
        user.surname = claims.surname;
        self.check_contract(&user)?;

        match self.users.create(&user).await {
            Ok(()) => {
                AuthEvent::builder(AuthEventType::UserProvisioned)
                    .source(&self.source_name)
                    .user(user.id)
                    .emit();
                Ok(user)
            }
            Err(err) if err.is_duplicate() => {
                tracing::debug!(source = %self.source_name, "Lost user creation race, fetching existing user");
                self.users.get_by_email(&email).await?.ok_or(AuthError::Storage(err))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn check_contract(&self, user: &LocalUser) -> AuthResult<()> {
        if user.is_valid() {
            Ok(())
        } else {
            Err(AuthError::contract_violation(
                &self.source_name,
                format!("user {} has no usable username or email", user.id),
            ))
        }
    }

    fn missing(&self, field: &'static str) -> AuthError {
        AuthError::MissingAttribute {
            source_name: self.source_name.clone(),
            field,
        }
    }

    /// Adopts the provider's session id and stores this authenticator's
    /// binding, so both sessions share one lifetime.
    ///
    /// Returns the previous local session id if it changed. A provider id
    /// that cannot name a session is not adopted.
    pub fn login_complete(&self, session: &mut SessionState) -> Option<String> {
        let previous = match self.provider.session_id(session) {
            Some(provider_id) if !SessionState::is_valid_id(&provider_id) => {
                tracing::warn!(
                    source = %self.source_name,
                    "Provider session id is not usable as a session id, keeping the local id"
                );
                None
            }
            Some(provider_id) if provider_id != session.id => {
                Some(std::mem::replace(&mut session.id, provider_id))
            }
            _ => None,
        };
        session.bind(self.binding());
        session.touch();
        previous
    }

    // === Hooks ===

    /// Fires the after-login hook.
    pub async fn on_after_login(&self, user: &LocalUser) {
        self.hooks.on_after_login(&self.source_name, user).await;
    }

    /// Fires the after-logout hook.
    pub async fn on_after_logout(&self, user_id: Option<Uuid>) {
        self.hooks
            .on_after_logout(Some(&self.source_name), user_id)
            .await;
    }
}
