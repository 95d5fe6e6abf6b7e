//! Auth actions.
//!
//! Each action works on the request's [`SessionState`] and returns what the
//! HTTP layer should do next. Loading and saving the session is left to the
//! caller so every request writes its session exactly once.
//!
//! ## Login
//!
//! Login takes two passes through the same action. The first sends the
//! browser to the identity provider with a return URL pointing back at
//! `/Security/login?as=<source>`; the second finds the provider session
//! established, finds or creates the local user and logs it in.

use axum::http::{header, HeaderMap, Uri};
use serde::Deserialize;
use ssp_auth::{
    AuthResult, Authenticator, LoginOptions, LogoutOptions, ProviderOutcome, SessionBinder,
};
use ssp_core::{AuthEvent, AuthEventType, BridgeConfig};
use ssp_session::{AuthState, SessionState};
use url::Url;

/// Path prefix of the auth actions.
pub const SECURITY_PATH: &str = "/Security";

/// Request details the actions depend on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Whether the request arrived over a secure transport.
    pub secure: bool,
    /// `Host` header.
    pub host: Option<String>,
    /// Request path and query string.
    pub path_and_query: String,
    /// `Referer` header.
    pub referer: Option<String>,
}

impl RequestContext {
    /// Reads the context from request headers and URI.
    ///
    /// A request counts as secure if its URI says so or a proxy in front of
    /// the server reports `X-Forwarded-Proto: https`.
    #[must_use]
    pub fn from_http(headers: &HeaderMap, uri: &Uri) -> Self {
        let header_str = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let forwarded_https = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"));

        Self {
            secure: forwarded_https || uri.scheme_str() == Some("https"),
            host: header_str(header::HOST).or_else(|| uri.authority().map(ToString::to_string)),
            path_and_query: uri
                .path_and_query()
                .map_or_else(|| uri.path().to_string(), ToString::to_string),
            referer: header_str(header::REFERER),
        }
    }
}

/// Query parameters accepted by the auth actions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionParams {
    /// Where to go once the action completes.
    #[serde(rename = "BackURL")]
    pub back_url: Option<String>,
    /// Source requested for this login.
    #[serde(rename = "as")]
    pub source: Option<String>,
}

/// What the HTTP layer should do after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResponse {
    /// Redirect the browser.
    Redirect(String),
    /// Reply with a plain-text body.
    Text(&'static str),
    /// Refuse the request with a plain-text reason.
    BadRequest(&'static str),
    /// Redirect and end the local session.
    EndSession {
        /// Redirect target.
        location: String,
    },
    /// Let the request through untouched.
    Continue,
}

/// Drives the login and logout protocol.
#[derive(Debug, Clone)]
pub struct AuthController {
    binder: SessionBinder,
}

impl AuthController {
    /// Creates a controller over a session binder.
    #[must_use]
    pub const fn new(binder: SessionBinder) -> Self {
        Self { binder }
    }

    /// Returns the session binder.
    #[must_use]
    pub const fn binder(&self) -> &SessionBinder {
        &self.binder
    }

    fn config(&self) -> &BridgeConfig {
        self.binder.registry().config()
    }

    /// Redirects plain HTTP requests to HTTPS when transport security is
    /// enforced. Returns `None` if the request may proceed.
    ///
    /// The target host is the configured canonical host, or else the
    /// request's `Host` header if it is a bare `host[:port]`. Without
    /// either the request is refused.
    #[must_use]
    pub fn require_transport_security(&self, ctx: &RequestContext) -> Option<ActionResponse> {
        if !self.config().force_transport_security || ctx.secure {
            return None;
        }
        let host = match self.config().canonical_host.as_deref() {
            Some(canonical) => Some(canonical.to_string()),
            None => ctx.host.as_deref().and_then(request_authority),
        };
        let Some(host) = host else {
            tracing::warn!(
                host = ?ctx.host,
                path = %ctx.path_and_query,
                "Refusing plain HTTP request without a usable Host header"
            );
            return Some(ActionResponse::BadRequest("secure transport required"));
        };
        tracing::debug!(%host, path = %ctx.path_and_query, "Upgrading request to HTTPS");
        Some(ActionResponse::Redirect(format!(
            "https://{host}{}",
            ctx.path_and_query
        )))
    }

    /// `/Security/login`
    ///
    /// Sends the browser to the identity provider, or, once the provider
    /// has authenticated it, logs in the local user and redirects to the
    /// back-URL or the default logged-in page.
    ///
    /// ## Errors
    ///
    /// Configuration errors, attribute failures and storage failures.
    pub async fn login(
        &self,
        session: &mut SessionState,
        ctx: &RequestContext,
        params: &ActionParams,
    ) -> AuthResult<ActionResponse> {
        if let Some(upgrade) = self.require_transport_security(ctx) {
            return Ok(upgrade);
        }
        if let Some(back_url) = params.back_url.as_deref() {
            capture_back_url(session, back_url, ctx);
        }

        let authenticator = self.binder.current(session, params.source.as_deref()).await?;
        let options = LoginOptions::new(login_return_url(authenticator.source_name()));

        match authenticator.require_auth(session, &options).await? {
            ProviderOutcome::Redirect(location) => {
                tracing::debug!(source = %authenticator.source_name(), "Sending browser to identity provider");
                session.state = AuthState::ProviderAuthenticating {
                    source: authenticator.source_name().to_string(),
                };
                Ok(ActionResponse::Redirect(location))
            }
            ProviderOutcome::Authenticated => self.complete_login(session, &authenticator).await,
        }
    }

    async fn complete_login(
        &self,
        session: &mut SessionState,
        authenticator: &Authenticator,
    ) -> AuthResult<ActionResponse> {
        let user = match authenticator.authenticate(session).await {
            Ok(user) => user,
            Err(err) => {
                AuthEvent::builder(AuthEventType::LoginError)
                    .source(authenticator.source_name())
                    .session(&session.id)
                    .failure(err.to_string())
                    .emit();
                return Err(err);
            }
        };

        if let Some(previous) = authenticator.login_complete(session) {
            tracing::debug!(previous = %previous, session_id = %session.id, "Session adopted provider session id");
        }
        session.log_in(user.id);

        let location = session
            .take_back_url()
            .unwrap_or_else(|| self.config().default_logged_in_url.clone());

        AuthEvent::builder(AuthEventType::Login)
            .source(authenticator.source_name())
            .user(user.id)
            .session(&session.id)
            .emit();
        authenticator.on_after_login(&user).await;

        Ok(ActionResponse::Redirect(location))
    }

    /// `/Security/logout`
    ///
    /// Hands logout to the identity provider, which returns the browser to
    /// `/Security/loggedout`.
    ///
    /// ## Errors
    ///
    /// Configuration errors and provider failures.
    pub async fn logout(
        &self,
        session: &mut SessionState,
        ctx: &RequestContext,
        params: &ActionParams,
    ) -> AuthResult<ActionResponse> {
        if let Some(upgrade) = self.require_transport_security(ctx) {
            return Ok(upgrade);
        }
        if let Some(back_url) = params.back_url.as_deref() {
            capture_back_url(session, back_url, ctx);
        }

        let logged_out_url = format!("{SECURITY_PATH}/loggedout");
        let Some(authenticator) = self.binder.load(session).await? else {
            tracing::debug!(session_id = %session.id, "No federation session to end");
            return Ok(ActionResponse::Redirect(logged_out_url));
        };

        session.state = AuthState::LoggingOut;
        AuthEvent::builder(AuthEventType::LogoutStarted)
            .source(authenticator.source_name())
            .session(&session.id)
            .emit();

        match authenticator
            .logout(session, &LogoutOptions::new(logged_out_url.clone()))
            .await?
        {
            ProviderOutcome::Redirect(location) => Ok(ActionResponse::Redirect(location)),
            ProviderOutcome::Authenticated => Ok(ActionResponse::Redirect(logged_out_url)),
        }
    }

    /// `/Security/loggedout`
    ///
    /// Ends the local login once the provider is done, then redirects to the
    /// back-URL or the default logged-out page. The caller discards the
    /// session record and its cookies.
    ///
    /// ## Errors
    ///
    /// Provider failures while finishing the logout.
    pub async fn logged_out(
        &self,
        session: &mut SessionState,
        ctx: &RequestContext,
    ) -> AuthResult<ActionResponse> {
        if let Some(upgrade) = self.require_transport_security(ctx) {
            return Ok(upgrade);
        }

        let user_id = session.log_out();
        let authenticator = match self.binder.restore(session) {
            Ok(authenticator) => authenticator,
            Err(err) if err.is_configuration() => {
                tracing::warn!(error = %err, "Bound authenticator no longer resolves");
                None
            }
            Err(err) => return Err(err),
        };

        if let Some(authenticator) = &authenticator {
            authenticator.finish_logout(session).await?;
        }

        let location = session
            .take_back_url()
            .unwrap_or_else(|| self.config().default_logged_out_url.clone());
        self.binder.clear(session);

        let mut event = AuthEvent::builder(AuthEventType::Logout).session(&session.id);
        if let Some(authenticator) = &authenticator {
            event = event.source(authenticator.source_name());
        }
        if let Some(user_id) = user_id {
            event = event.user(user_id);
        }
        event.emit();

        match &authenticator {
            Some(authenticator) => authenticator.on_after_logout(user_id).await,
            None => {
                self.binder
                    .registry()
                    .hooks()
                    .on_after_logout(None, user_id)
                    .await;
            }
        }

        Ok(ActionResponse::EndSession { location })
    }

    /// `/Security/LoginForm`
    ///
    /// Forces a fresh login at the identity provider. The referring page
    /// becomes the back-URL.
    ///
    /// ## Errors
    ///
    /// Configuration errors and provider failures.
    pub async fn login_form(
        &self,
        session: &mut SessionState,
        ctx: &RequestContext,
    ) -> AuthResult<ActionResponse> {
        if let Some(upgrade) = self.require_transport_security(ctx) {
            return Ok(upgrade);
        }
        if let Some(referer) = ctx.referer.as_deref() {
            capture_back_url(session, referer, ctx);
        }

        let authenticator = self.binder.current(session, None).await?;
        let return_to = login_return_url(authenticator.source_name());
        let options = LoginOptions::new(return_to.clone()).forced();

        session.state = AuthState::ProviderAuthenticating {
            source: authenticator.source_name().to_string(),
        };
        match authenticator.login(session, &options).await? {
            ProviderOutcome::Redirect(location) => Ok(ActionResponse::Redirect(location)),
            ProviderOutcome::Authenticated => Ok(ActionResponse::Redirect(return_to)),
        }
    }

    /// `/Security`
    ///
    /// Redirects to the identity provider's portal page.
    ///
    /// ## Errors
    ///
    /// Configuration errors and provider failures.
    pub async fn index(
        &self,
        session: &mut SessionState,
        ctx: &RequestContext,
    ) -> AuthResult<ActionResponse> {
        if let Some(upgrade) = self.require_transport_security(ctx) {
            return Ok(upgrade);
        }
        let authenticator = self.binder.current(session, None).await?;
        let location = authenticator
            .provider()
            .portal_url()
            .unwrap_or_else(|| self.config().default_logged_in_url.clone());
        Ok(ActionResponse::Redirect(location))
    }

    /// `/Security/ping`
    #[must_use]
    pub const fn ping(&self) -> ActionResponse {
        ActionResponse::Text("1")
    }

    /// Tries a silent login for an anonymous visitor of a host page.
    ///
    /// Runs at most once per session. On success the provider returns the
    /// browser through the login action and back to the page; on failure it
    /// returns the browser to the page directly.
    ///
    /// ## Errors
    ///
    /// Configuration errors and provider failures.
    pub async fn passive_login(
        &self,
        session: &mut SessionState,
        ctx: &RequestContext,
    ) -> AuthResult<ActionResponse> {
        if let Some(upgrade) = self.require_transport_security(ctx) {
            return Ok(upgrade);
        }
        if session.is_logged_in() || session.passive_attempted {
            return Ok(ActionResponse::Continue);
        }

        session.mark_passive_attempt();
        let authenticator = self.binder.current(session, None).await?;
        AuthEvent::builder(AuthEventType::PassiveLoginAttempt)
            .source(authenticator.source_name())
            .session(&session.id)
            .emit();

        let return_to = format!(
            "{}&BackURL={}",
            login_return_url(authenticator.source_name()),
            urlencoding::encode(&ctx.path_and_query)
        );
        let options = LoginOptions::new(return_to)
            .passive()
            .with_error_url(ctx.path_and_query.clone());

        match authenticator.login(session, &options).await? {
            ProviderOutcome::Redirect(location) => Ok(ActionResponse::Redirect(location)),
            ProviderOutcome::Authenticated => Ok(ActionResponse::Continue),
        }
    }
}

/// Return URL handed to the identity provider for a source.
#[must_use]
pub fn login_return_url(source_name: &str) -> String {
    format!(
        "{SECURITY_PATH}/login?as={}",
        urlencoding::encode(source_name)
    )
}

fn capture_back_url(session: &mut SessionState, raw: &str, ctx: &RequestContext) {
    match local_redirect(raw, ctx.host.as_deref()) {
        Some(url) => session.set_back_url(url),
        None => tracing::warn!(back_url = %raw, "Ignoring back-URL outside this site"),
    }
}

fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Checks a `Host` header value and returns it normalized.
///
/// Only a bare `host[:port]` passes; anything carrying credentials, a path,
/// a query or a fragment yields `None`.
#[must_use]
pub fn request_authority(raw: &str) -> Option<String> {
    let url = Url::parse(&format!("https://{}", raw.trim())).ok()?;
    let bare = url.username().is_empty()
        && url.password().is_none()
        && url.path() == "/"
        && url.query().is_none()
        && url.fragment().is_none();
    if bare {
        authority(&url)
    } else {
        None
    }
}

/// Reduces a redirect target to a path on this site.
///
/// Relative paths are kept as they are. Absolute URLs are accepted only if
/// they point at `host`, and are reduced to their path and query.
/// Anything else, including protocol-relative URLs, yields `None`.
#[must_use]
pub fn local_redirect(raw: &str, host: Option<&str>) -> Option<String> {
    let raw = raw.trim();
    if raw.starts_with('/') {
        let escapes_site = raw.starts_with("//") || raw.starts_with("/\\");
        return (!escapes_site).then(|| raw.to_string());
    }

    let url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let authority = authority(&url)?;
    if !host.is_some_and(|h| h.eq_ignore_ascii_case(&authority)) {
        return None;
    }

    let mut local = url.path().to_string();
    if let Some(query) = url.query() {
        local.push('?');
        local.push_str(query);
    }
    Some(local)
}
