//! In-process development identity provider.
//!
//! Stands in for a federation service during local runs and tests. It keeps
//! provider sessions in memory and points the browser's session at one of
//! them through a provider note. With auto-authentication enabled every
//! login completes immediately, redirecting straight back to the return URL
//! just as a real provider would after the user signed in.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ssp_core::DevProviderConfig;
use ssp_model::FederatedAttributeSet;
use ssp_session::SessionState;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::provider::{IdentityProvider, LoginOptions, LogoutOptions, ProviderOutcome};

/// Provider note holding the provider session id.
pub const SESSION_NOTE: &str = "ssp.provider.session";

const DEFAULT_SSO_URL: &str = "/simplesaml/module.php/core/authenticate.php";
const DEFAULT_PORTAL_URL: &str = "/simplesaml/module.php/core/frontpage_welcome.php";

#[derive(Debug, Clone)]
struct ProviderSession {
    attributes: FederatedAttributeSet,
    created_at: DateTime<Utc>,
}

/// In-memory identity provider for one source.
#[derive(Debug)]
pub struct InMemoryIdentityProvider {
    source_name: String,
    auto_attributes: Option<FederatedAttributeSet>,
    sso_url: String,
    portal_url: String,
    sessions: DashMap<String, ProviderSession>,
}

impl InMemoryIdentityProvider {
    /// Creates a provider that never completes logins by itself.
    #[must_use]
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            auto_attributes: None,
            sso_url: DEFAULT_SSO_URL.to_string(),
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            sessions: DashMap::new(),
        }
    }

    /// Creates a provider from development settings.
    #[must_use]
    pub fn from_config(source_name: impl Into<String>, config: &DevProviderConfig) -> Self {
        let mut provider = Self::new(source_name);
        if config.auto_authenticate {
            provider.auto_attributes = Some(config.attributes.clone().into());
        }
        if let Some(url) = &config.sso_url {
            provider.sso_url.clone_from(url);
        }
        if let Some(url) = &config.portal_url {
            provider.portal_url.clone_from(url);
        }
        provider
    }

    /// Completes every login immediately, releasing `attributes`.
    #[must_use]
    pub fn with_auto_authenticate(mut self, attributes: FederatedAttributeSet) -> Self {
        self.auto_attributes = Some(attributes);
        self
    }

    /// Sets the login page used when logins are not completed automatically.
    #[must_use]
    pub fn with_sso_url(mut self, url: impl Into<String>) -> Self {
        self.sso_url = url.into();
        self
    }

    /// Establishes a provider session for the browser and returns its id.
    pub fn authenticate_session(
        &self,
        session: &mut SessionState,
        attributes: FederatedAttributeSet,
    ) -> String {
        let id = Uuid::new_v4().simple().to_string();
        self.sessions.insert(
            id.clone(),
            ProviderSession {
                attributes,
                created_at: Utc::now(),
            },
        );
        session.set_note(SESSION_NOTE, id.clone());
        tracing::debug!(source = %self.source_name, provider_session = %id, "Provider session established");
        id
    }

    /// Ends a provider session, as if it had timed out at the provider.
    ///
    /// Returns `false` if no such session exists.
    pub fn expire_session(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Ends every provider session.
    pub fn expire_all(&self) {
        self.sessions.clear();
    }

    /// Returns the number of live provider sessions.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Returns when a provider session was established.
    #[must_use]
    pub fn session_started(&self, id: &str) -> Option<DateTime<Utc>> {
        self.sessions.get(id).map(|s| s.created_at)
    }

    fn current(&self, session: &SessionState) -> Option<ProviderSession> {
        let id = session.note(SESSION_NOTE)?;
        self.sessions.get(id).map(|s| s.value().clone())
    }

    fn end_current(&self, session: &mut SessionState) {
        if let Some(id) = session.remove_note(SESSION_NOTE) {
            self.sessions.remove(&id);
        }
    }

    fn start_login(&self, session: &mut SessionState, options: &LoginOptions) -> ProviderOutcome {
        if let Some(attributes) = &self.auto_attributes {
            self.authenticate_session(session, attributes.clone());
            return ProviderOutcome::Redirect(options.return_to.clone());
        }

        if options.passive {
            let target = options
                .error_url
                .clone()
                .unwrap_or_else(|| options.return_to.clone());
            tracing::debug!(source = %self.source_name, "Passive login failed, no provider session");
            return ProviderOutcome::Redirect(target);
        }

        ProviderOutcome::Redirect(format!(
            "{}?AuthId={}&ReturnTo={}",
            self.sso_url,
            urlencoding::encode(&self.source_name),
            urlencoding::encode(&options.return_to)
        ))
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    async fn is_authenticated(&self, session: &SessionState) -> AuthResult<bool> {
        Ok(self.current(session).is_some())
    }

    async fn require_auth(
        &self,
        session: &mut SessionState,
        options: &LoginOptions,
    ) -> AuthResult<ProviderOutcome> {
        if self.current(session).is_some() {
            return Ok(ProviderOutcome::Authenticated);
        }
        Ok(self.start_login(session, options))
    }

    async fn login(
        &self,
        session: &mut SessionState,
        options: &LoginOptions,
    ) -> AuthResult<ProviderOutcome> {
        if options.force {
            self.end_current(session);
        } else if self.current(session).is_some() {
            return Ok(ProviderOutcome::Redirect(options.return_to.clone()));
        }
        Ok(self.start_login(session, options))
    }

    async fn logout(
        &self,
        session: &mut SessionState,
        options: &LogoutOptions,
    ) -> AuthResult<ProviderOutcome> {
        self.end_current(session);
        Ok(ProviderOutcome::Redirect(options.return_to.clone()))
    }

    async fn attributes(&self, session: &SessionState) -> AuthResult<FederatedAttributeSet> {
        self.current(session)
            .map(|s| s.attributes)
            .ok_or_else(|| AuthError::NotAuthenticated {
                source_name: self.source_name.clone(),
            })
    }

    fn session_id(&self, session: &SessionState) -> Option<String> {
        session.note(SESSION_NOTE).map(str::to_string)
    }

    fn portal_url(&self) -> Option<String> {
        Some(self.portal_url.clone())
    }
}
